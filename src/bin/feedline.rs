//! feedline: command-line access to a feedline database.
//!
//! Seeds profiles and comments, posts, toggles likes and prints the feed
//! as a given viewer would see it.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use feedline::compose::submit_post;
use feedline::feed::assemble_feed;
use feedline::like_toggle::{LikeController, ToggleOutcome};
use feedline::lookup::LookupPolicy;
use feedline::storage::{db_path, ProfileRow, Storage};
use feedline::store::SqliteStore;
use feedline::web_client::config::default_data_dir;

#[derive(Parser, Debug)]
#[command(name = "feedline", version, about)]
struct Cli {
    /// Directory holding the database [env: FEEDLINE_HOME] [default: ~/.feedline]
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or replace a user's profile
    Profile {
        user_id: String,
        username: String,
        display_name: String,
        avatar_url: Option<String>,
    },
    /// Publish a post
    Post { author_id: String, content: String },
    /// Add a comment to a post
    Comment {
        post_id: String,
        author_id: String,
        body: String,
    },
    /// Like a post, or unlike it if already liked
    Like { post_id: String, user_id: String },
    /// Print the feed, optionally as seen by a viewer
    Feed { viewer_id: Option<String> },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    feedline::logging::init();
    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("FEEDLINE_HOME").ok().map(PathBuf::from))
        .unwrap_or_else(default_data_dir);
    let store = Arc::new(SqliteStore::new(Storage::open(&db_path(&data_dir))?));
    let policy = LookupPolicy::default();

    match cli.command {
        Command::Profile {
            user_id,
            username,
            display_name,
            avatar_url,
        } => {
            store.storage().lock().await.upsert_profile(&ProfileRow {
                user_id,
                username,
                display_name,
                avatar_url,
            })?;
            println!("profile saved");
        }
        Command::Post { author_id, content } => {
            let post = submit_post(&*store, &content, Some(&author_id)).await?;
            println!("{}", post.id);
        }
        Command::Comment {
            post_id,
            author_id,
            body,
        } => {
            let comment = store
                .storage()
                .lock()
                .await
                .insert_comment(&post_id, &author_id, &body)?;
            println!("comment {} added", comment.id);
        }
        Command::Like { post_id, user_id } => {
            let likes = LikeController::new(Arc::clone(&store), policy);
            match likes.toggle_like(&post_id, Some(&user_id)).await? {
                ToggleOutcome::Settled(snapshot) => {
                    let verb = if snapshot.liked { "liked" } else { "unliked" };
                    println!("{verb} ({} like(s))", snapshot.like_count);
                }
                ToggleOutcome::Ignored(reason) => println!("ignored: {reason:?}"),
                ToggleOutcome::Reverted { notice, .. } => {
                    return Err(format!("{}: {}", notice.title, notice.description).into())
                }
            }
        }
        Command::Feed { viewer_id } => {
            let items = assemble_feed(&*store, &policy, viewer_id.as_deref()).await?;
            if items.is_empty() {
                println!("No posts yet. Be the first to share something!");
            }
            for item in items {
                let heart = if item.liked_by_viewer() { "♥" } else { "♡" };
                println!(
                    "{} {} · {}\n  {}\n  💬 {}  {} {}\n",
                    item.display_name(),
                    item.handle(),
                    item.post.id,
                    item.post.content,
                    item.comment_count(),
                    heart,
                    item.like_count(),
                );
            }
        }
    }
    Ok(())
}
