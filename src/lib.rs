mod builtin;
mod cli;
mod error;
mod post;
mod progress;
mod render;
mod store;
mod transport;
mod view;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use cli::{Args, Command, PostFields};

pub use cli::ProgressMode;
pub use cli::{Args as CliArgs, Command as CliCommand, PostFields as CliPostFields};
pub use error::{StoreError, TransportError};
pub use post::Post;
pub use render::{render_page, render_post};
pub use store::{CollectionHandle, CollectionOutcome, PostStore};
pub use transport::{Transport, TransportConfig};
pub use view::{PostsView, ViewState};

pub async fn run(args: Args) -> anyhow::Result<()> {
    use std::io::IsTerminal as _;

    let progress_enabled = match args.progress {
        ProgressMode::Always => true,
        ProgressMode::Never => false,
        ProgressMode::Auto => std::io::stderr().is_terminal(),
    };
    let progress = progress::Progress::new(progress_enabled);

    let transport = Transport::new(&TransportConfig {
        api_url: args.api_url.clone(),
        user_agent: args.user_agent.clone(),
        timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
    })?;
    tracing::debug!(url = %transport.posts_url(), "posts endpoint");

    let store = Arc::new(
        PostStore::new(transport).with_max_age(args.cache_max_age_secs.map(Duration::from_secs)),
    );

    let res = execute(args.command, store, &progress).await;
    progress.finish();
    res
}

async fn execute(
    command: Command,
    store: Arc<PostStore>,
    progress: &progress::Progress,
) -> anyhow::Result<()> {
    match command {
        Command::List => {
            progress.set_stage("fetching posts");
            let posts = store.collection().get().await?;
            print_json(posts.as_slice())
        }
        Command::Get { id } => {
            progress.set_stage(format!("fetching post {id}"));
            let post = store.get_by_id(id).await?;
            print_json(&post)
        }
        Command::Create(fields) => {
            progress.set_stage("creating post");
            let post = store.create(&draft(fields)).await?;
            print_json(&post)
        }
        Command::Update { id, fields } => {
            progress.set_stage(format!("updating post {id}"));
            let post = Post {
                id: Some(id),
                ..draft(fields)
            };
            let post = store.update(id, &post).await?;
            print_json(&post)
        }
        Command::Delete { id } => {
            progress.set_stage(format!("deleting post {id}"));
            store.delete(id).await?;
            tracing::info!(id, "deleted post");
            Ok(())
        }
        Command::Render { out, title } => {
            progress.set_stage("loading posts");
            render_to_file(store, &out, &title).await
        }
    }
}

async fn render_to_file(store: Arc<PostStore>, out: &Path, title: &str) -> anyhow::Result<()> {
    let view = PostsView::new(store);
    view.activate().await;
    let html = view.render(title);
    let state = view.state();
    view.teardown();

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    std::fs::write(out, html).with_context(|| format!("write {}", out.display()))?;
    tracing::info!(path = %out.display(), posts = state.posts.len(), "wrote page");

    if let Some(error) = state.error {
        anyhow::bail!("{error}");
    }
    Ok(())
}

fn draft(fields: PostFields) -> Post {
    Post::draft(fields.name, fields.img, fields.text, fields.time)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{text}");
    Ok(())
}
