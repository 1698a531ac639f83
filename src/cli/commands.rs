use colored::Colorize;

use crate::affiliate::types::{CommissionQuery, OrganizationFilter, UpdateAffiliateRequest};
use crate::app::App;
use crate::auth::types::{SigninRequest, UpdateProfileRequest};
use crate::error::ClientError;

use super::output;

pub async fn run_signin(app: &App, email: &str, password: &str, json: bool) -> Result<(), ClientError> {
    let session = app.signin(&SigninRequest::new(email, password)).await?;
    if json {
        output::print_json(&serde_json::json!({
            "isAuthenticated": session.is_authenticated,
            "user": session.user,
            "expiresAt": session.expires_at,
        }));
    } else {
        let name = session
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| email.to_string());
        println!("{} as {}", "Signed in".green().bold(), name);
    }
    Ok(())
}

pub async fn run_signout(app: &App, json: bool) -> Result<(), ClientError> {
    app.sign_out().await;
    if json {
        output::print_json(&serde_json::json!({ "isAuthenticated": false }));
    } else {
        println!("Signed out");
    }
    Ok(())
}

pub async fn run_status(app: &App, json: bool) -> Result<(), ClientError> {
    let store = app.store();
    store.wait_hydrated().await;
    let session = store.snapshot();
    if json {
        output::print_json(&serde_json::json!({
            "hydrated": store.is_hydrated(),
            "isAuthenticated": session.is_authenticated,
            "user": session.user,
            "expiresAt": session.expires_at,
            "hasRefreshToken": session.refresh_token.is_some(),
            "apiBaseUrl": app.settings().api_base_url,
        }));
    } else {
        output::print_status(&session, store.is_hydrated());
    }
    Ok(())
}

pub async fn run_profile_show(app: &App, json: bool) -> Result<(), ClientError> {
    app.require_session().await?;
    let user = app.profiles().get_profile().await?;
    if json {
        output::print_json(&user);
    } else {
        output::print_user(&user);
    }
    Ok(())
}

pub async fn run_profile_update(
    app: &App,
    update: &UpdateProfileRequest,
    json: bool,
) -> Result<(), ClientError> {
    app.require_session().await?;
    let user = app.profiles().update_profile(update).await?;
    if json {
        output::print_json(&user);
    } else {
        println!("{}", "Profile updated".green());
        output::print_user(&user);
    }
    Ok(())
}

pub async fn run_affiliate_show(app: &App, json: bool) -> Result<(), ClientError> {
    app.require_session().await?;
    let affiliate = app.affiliates().get_profile().await?;
    if json {
        output::print_json(&affiliate);
    } else {
        output::print_affiliate(&affiliate);
    }
    Ok(())
}

pub async fn run_affiliate_update(
    app: &App,
    update: &UpdateAffiliateRequest,
    json: bool,
) -> Result<(), ClientError> {
    app.require_session().await?;
    let affiliate = app.affiliates().update_profile(update).await?;
    if json {
        output::print_json(&affiliate);
    } else {
        println!("{}", "Affiliate account updated".green());
        output::print_affiliate(&affiliate);
    }
    Ok(())
}

pub async fn run_organizations(
    app: &App,
    filter: &OrganizationFilter,
    json: bool,
) -> Result<(), ClientError> {
    app.require_session().await?;
    let orgs = filter.apply(app.affiliates().organizations().await?);
    if json {
        output::print_json(&orgs);
    } else {
        output::print_organizations(&orgs);
    }
    Ok(())
}

pub async fn run_commissions(app: &App, query: &CommissionQuery, json: bool) -> Result<(), ClientError> {
    app.require_session().await?;
    let commissions = app.affiliates().commissions(query).await?;
    if json {
        output::print_json(&commissions);
    } else {
        output::print_commissions(&commissions);
    }
    Ok(())
}

pub async fn run_summary(app: &App, year: Option<i32>, json: bool) -> Result<(), ClientError> {
    app.require_session().await?;
    let summary = app.affiliates().commission_summary(year).await?;
    if json {
        output::print_json(&summary);
    } else {
        output::print_summary(&summary);
    }
    Ok(())
}
