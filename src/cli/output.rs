use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::affiliate::types::{
    Affiliate, Commission, CommissionSummary, CommissionTotals, Organization,
};
use crate::auth::types::User;
use crate::error::ClientError;
use crate::session::Session;

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

pub fn print_error(err: &ClientError, json_mode: bool) {
    if json_mode {
        print_json(&err.to_json());
    } else {
        eprintln!("{}: {}", "Error".red().bold(), err);
    }
}

pub fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn day(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<22} {}", format!("{label}:").dimmed(), value);
}

pub fn print_status(session: &Session, hydrated: bool) {
    if session.is_authenticated {
        println!("{}", "Signed in".green().bold());
    } else {
        println!("{}", "Not signed in".yellow().bold());
    }
    field("Session restored", if hydrated { "yes" } else { "no" });
    if let Some(ref user) = session.user {
        field("User", format!("{} <{}>", user.display_name(), user.email));
    }
    if let Some(expires) = session.expires_at {
        let state = if session.is_expired() { " (expired)" } else { "" };
        field("Access token expires", format!("{}{state}", expires.to_rfc3339()));
    }
    field(
        "Refresh token",
        if session.refresh_token.is_some() { "present" } else { "none" },
    );
}

pub fn print_user(user: &User) {
    println!("{}", user.display_name().bold());
    field("Email", &user.email);
    field("First name", &user.first_name);
    field("Last name", &user.last_name);
    field("Role", format!("{:?}", user.user_type));
    field("Status", format!("{:?}", user.status));
}

pub fn print_affiliate(affiliate: &Affiliate) {
    println!("{}", affiliate.business_name.bold());
    field("Name", &affiliate.name);
    field("Contact email", &affiliate.primary_contact_email);
    if let Some(ref phone) = affiliate.primary_contact_phone {
        field("Contact phone", phone);
    }
    field(
        "Default rate",
        format!("{:.1}%", affiliate.default_commission_rate * 100.0),
    );
    field("Account balance", money(affiliate.account_balance));
    field("Status", format!("{:?}", affiliate.status));
    if let Some(ref counts) = affiliate.counts {
        field("Organizations", counts.organizations);
        field("Commissions", counts.commissions);
        field("Sold subscriptions", counts.sold_subscriptions);
    }
    field("Member since", day(&affiliate.created_at));
}

pub fn print_organizations(orgs: &[Organization]) {
    if orgs.is_empty() {
        println!("{}", "No organizations yet.".dimmed());
        return;
    }
    println!(
        "{}",
        format!("{:<28} {:<12} {:<10} {:>8}  {}", "ORGANIZATION", "INDUSTRY", "STATUS", "RATE", "SINCE")
            .bold()
    );
    for org in orgs {
        let rate = org
            .custom_commission_rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "default".to_string());
        println!(
            "{:<28} {:<12} {:<10} {:>8}  {}",
            org.business_name,
            org.industry_type.label(),
            org.status.as_str(),
            rate,
            day(&org.created_at),
        );
    }
}

pub fn print_commissions(commissions: &[Commission]) {
    if commissions.is_empty() {
        println!("{}", "No commissions match these filters.".dimmed());
        return;
    }
    println!(
        "{}",
        format!(
            "{:<24} {:<18} {:<11} {:>12} {:>12}  {}",
            "ORGANIZATION", "TYPE", "STATUS", "REVENUE", "NET", "PERIOD"
        )
        .bold()
    );
    for c in commissions {
        let org = c
            .organization
            .as_ref()
            .map(|o| o.business_name.as_str())
            .unwrap_or(c.organization_id.as_str());
        println!(
            "{:<24} {:<18} {:<11} {:>12} {:>12}  {}..{}",
            org,
            c.commission_type.label(),
            c.status.label(),
            money(c.organization_revenue),
            money(c.net_commission),
            day(&c.period_start),
            day(&c.period_end),
        );
    }
    let totals = CommissionTotals::of(commissions);
    println!();
    field("Earned", money(totals.earned));
    field("Paid", money(totals.paid));
    field("Pending", money(totals.pending));
}

pub fn print_summary(summary: &CommissionSummary) {
    println!("{}", "Commission summary".bold());
    field("Earned", money(summary.total_commissions_earned));
    field("Paid", money(summary.total_commissions_paid).green());
    field("Pending", money(summary.total_commissions_pending).yellow());

    if !summary.commissions_by_type.is_empty() {
        println!("{}", "By type".bold());
        for (kind, amount) in &summary.commissions_by_type {
            let label = kind
                .parse::<crate::affiliate::CommissionType>()
                .map(|t| t.label().to_string())
                .unwrap_or_else(|_| kind.clone());
            field(&label, money(*amount));
        }
    }
    if !summary.commissions_by_status.is_empty() {
        println!("{}", "By status".bold());
        for (status, amount) in &summary.commissions_by_status {
            let label = status
                .parse::<crate::affiliate::CommissionStatus>()
                .map(|s| s.label().to_string())
                .unwrap_or_else(|_| status.clone());
            field(&label, money(*amount));
        }
    }
    if !summary.monthly_breakdown.is_empty() {
        println!("{}", "By month".bold());
        for month in &summary.monthly_breakdown {
            field(
                &month.month,
                format!(
                    "{} total, {} paid, {} pending",
                    money(month.total_commissions),
                    money(month.paid_commissions),
                    money(month.pending_commissions)
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_formats_two_decimals() {
        assert_eq!(money(12.5), "$12.50");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1234.567), "$1234.57");
    }

    #[test]
    fn day_formats_date_only() {
        let ts: DateTime<Utc> = "2024-03-01T10:15:00Z".parse().unwrap();
        assert_eq!(day(&ts), "2024-03-01");
    }
}
