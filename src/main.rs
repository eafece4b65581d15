use std::sync::Arc;

use chirpline::{
    AppResult, Client,
    auth::AuthClient,
    config::ClientConfig,
    graphql::http::HttpBackend,
    live::LiveView,
    logging,
    model::Post,
    posts::FeedScope,
    profiles,
    reconcile::{PushOutcome, Resolved},
    storage::HttpObjectStore,
};

fn print_entry(entry: &Resolved<Post>) {
    let attachments = entry.media.len();
    let suffix = if attachments > 0 { format!(" [{attachments} attachment(s)]") } else { String::new() };
    println!("{} @{}: {}{suffix}", entry.record.created_at, entry.owner.username, entry.record.content);
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = ClientConfig::from_env()?;
    logging::init_tracing(&config)?;

    let username = dotenv::var("CHIRPLINE_USERNAME").map_err(|_| "missing CHIRPLINE_USERNAME")?;
    let password = dotenv::var("CHIRPLINE_PASSWORD").map_err(|_| "missing CHIRPLINE_PASSWORD")?;

    let auth = AuthClient::from_config(&config)?;
    let session = Arc::new(auth.sign_in(&username, &password).await?);

    let backend = HttpBackend::new(&config.graphql_url, session.clone())?.with_api_key(config.api_key.clone());
    let store = HttpObjectStore::new(&config.storage_url, config.url_ttl, session.clone());
    let client = Client::new(Arc::new(backend), Arc::new(store), session.identity().clone())
        .with_page_size(config.page_size);

    let me = profiles::ensure_profile(&client).await?;
    tracing::info!(username = %me.username, "profile ready");

    let mut feed = LiveView::new(client.clone(), FeedScope::Everyone);
    if let Err(err) = feed.mount().await {
        tracing::error!(error = %err, "feed unavailable");
    }
    for entry in feed.items().iter().rev() {
        print_entry(entry);
    }

    let mut notices = client.notices.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Ok(notice) = notices.recv() => eprintln!("! {}", notice.message),
            outcome = feed.next_push() => match outcome {
                Some(PushOutcome::Inserted(index)) => {
                    if let Some(entry) = feed.items().get(index) {
                        print_entry(entry);
                    }
                }
                Some(_) => {}
                None => {
                    tracing::warn!("feed is no longer live, waiting for Ctrl-C");
                    let _ = tokio::signal::ctrl_c().await;
                    break;
                }
            },
        }
    }

    feed.unmount();
    auth.sign_out(&session).await?;
    Ok(())
}
