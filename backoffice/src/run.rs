use crate::Result;
use crate::command::{
    run_approve, run_dashboard, run_export, run_list, run_login, run_logout, run_order, run_org,
    run_org_status, run_product_tags, run_products, run_register_org, run_reject, run_search,
    run_whoami,
};
use crate::config::{CliArgs, Commands, Config, ListKind};
use crate::services::ApiClient;
use crate::session::{AuthContext, SessionStore};

pub async fn run_command(args: CliArgs) -> Result<()> {
    let config = Config::build(&args.config)?;
    let session = SessionStore::file(config.session_file.clone())?;
    let client = ApiClient::new(&config.api_url, session);

    // Signing in or out never depends on the stored token being verifiable
    match args.command {
        Commands::Login => return run_login(&mut AuthContext::signed_out(client)).await,
        Commands::Logout => return run_logout(&mut AuthContext::signed_out(client)),
        _ => {}
    }

    let auth = AuthContext::load(client).await?;
    match args.command {
        Commands::Login | Commands::Logout => Ok(()),
        Commands::Whoami => run_whoami(&auth),
        Commands::Orgs(list) => run_list(&config, &auth, ListKind::Orgs, &list).await,
        Commands::Orders(list) => run_list(&config, &auth, ListKind::Orders, &list).await,
        Commands::Pending(list) => run_list(&config, &auth, ListKind::Pending, &list).await,
        Commands::Order { id } => run_order(&auth, &id).await,
        Commands::Approve(approve) => run_approve(&auth, &approve).await,
        Commands::Reject { id, reason } => run_reject(&auth, &id, &reason).await,
        Commands::Org { id } => run_org(&auth, &id).await,
        Commands::RegisterOrg => run_register_org(&auth).await,
        Commands::OrgStatus { id, status } => run_org_status(&auth, &id, &status).await,
        Commands::Products => run_products(&auth).await,
        Commands::ProductTags(tags) => run_product_tags(&auth, &tags).await,
        Commands::Dashboard => run_dashboard(&auth).await,
        Commands::Search { list } => run_search(&config, &auth, list).await,
        Commands::Export {
            list,
            format,
            filter,
        } => run_export(&config, &auth, list, format, &filter).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_logout_with_backend_down() {
        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session");
        fs::write(&session_file, "stale-token").unwrap();

        let config_file = dir.path().join("config.toml");
        let config = format!(
            "api_url = \"http://127.0.0.1:9\"\nsession_file = {:?}\nexport_dir = {:?}\n",
            session_file.display().to_string(),
            dir.path().display().to_string()
        );
        fs::write(&config_file, config).unwrap();

        let args = CliArgs {
            command: Commands::Logout,
            config: config_file,
        };
        let result = run_command(args).await;

        assert!(result.is_ok());
        assert!(!session_file.exists());
    }
}
