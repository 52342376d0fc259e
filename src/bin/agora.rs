//! Agora CLI — poke the discussion engine from a terminal.
//!
//! Usage:
//!   agora list [--query q] [--topic t] [--uni u] [--page n]
//!   agora show <id>
//!   agora post --title t --summary s --topic x [--body b] [--book id ...]
//!   agora reports [--handle id --kind post|reply [--delete]]
//!   agora notifications [--watch]
//!
//! Connection comes from --base-url/--token or AGORA_API / AGORA_TOKEN.

use agora::api::{ApiConfig, HttpForumApi};
use agora::model::{Actor, ActorId, BookId, ReportId, ReportKind, Role, ThreadId};
use agora::moderation::ModerationDesk;
use agora::notify::NotificationCenter;
use agora::page::{DiscussionPage, ThreadDraft};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "agora", version, about = "Campus forum discussion engine")]
struct Cli {
    /// Base URL of the collaborator API
    #[arg(long, env = "AGORA_API", default_value = "http://localhost:8000/api")]
    base_url: String,

    /// Bearer token
    #[arg(long, env = "AGORA_TOKEN")]
    token: Option<String>,

    /// Acting user id (permission checks are client-side too)
    #[arg(long, default_value_t = 0)]
    actor: i64,

    /// Acting role: student, researcher or admin
    #[arg(long, default_value = "student")]
    role: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List threads on the current page
    List {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        uni: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one thread with its reply forest
    Show { id: i64 },
    /// Create a thread
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        uni: Option<String>,
        /// Attach a catalog reference item (repeatable)
        #[arg(long = "book")]
        books: Vec<i64>,
    },
    /// Show the unhandled report queue; optionally resolve one report
    Reports {
        #[arg(long)]
        handle: Option<i64>,
        /// post or reply, required with --handle
        #[arg(long)]
        kind: Option<String>,
        /// Also soft-delete the reported content
        #[arg(long)]
        delete: bool,
    },
    /// Print notifications; --watch keeps both pollers running
    Notifications {
        #[arg(long)]
        watch: bool,
    },
}

fn parse_role(role: &str) -> Role {
    match role {
        "admin" => Role::Admin,
        "researcher" => Role::Researcher,
        "student" => Role::Student,
        _ => Role::Unknown,
    }
}

async fn cmd_list(
    page: &DiscussionPage<HttpForumApi>,
    query: Option<String>,
    topic: Option<String>,
    uni: Option<String>,
    page_no: usize,
) -> i32 {
    if let Some(q) = query {
        page.set_query(q);
    }
    page.set_topic(topic);
    page.set_university(uni);
    loop {
        if let Err(e) = page.load().await {
            eprintln!("Error: {}", e);
            return 1;
        }
        if page.page() >= page_no || !page.has_more() {
            break;
        }
        page.next_page();
    }
    let cards = page.cards();
    if cards.is_empty() {
        println!("No threads.");
        return 0;
    }
    for card in cards {
        println!(
            "#{:<6} [{}] {} — {} replies",
            card.thread.id, card.thread.topic, card.thread.title, card.thread.replies_count
        );
    }
    0
}

async fn cmd_show(page: &DiscussionPage<HttpForumApi>, id: i64) -> i32 {
    if let Err(e) = page.open_thread(ThreadId(id)).await {
        eprintln!("Error: {}", e);
        return 1;
    }
    page.with_open(|pane| {
        println!("{}", pane.thread.title);
        println!("by {} — {}", pane.thread.author.display_name(), pane.thread.created_at);
        println!();
        println!("{}", pane.thread.body);
        for group in pane.forest.render() {
            println!("> {}: {}", group.root.author.display_name(), group.root.body);
            for child in &group.children {
                println!("  > {}: {}", child.author.display_name(), child.body);
            }
        }
    });
    0
}

async fn cmd_post(
    page: &DiscussionPage<HttpForumApi>,
    title: String,
    summary: String,
    topic: String,
    body: Option<String>,
    uni: Option<String>,
    books: Vec<i64>,
) -> i32 {
    let mut draft = ThreadDraft::new();
    draft.title = title;
    draft.summary = summary;
    draft.body = body.unwrap_or_default();
    draft.topic = topic;
    draft.university = uni;
    draft.book_ids = books.into_iter().map(BookId).collect();
    match page.submit_thread(&draft).await {
        Ok(id) => {
            println!("Created thread #{}", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_reports(
    desk: &ModerationDesk<HttpForumApi>,
    handle: Option<i64>,
    kind: Option<String>,
    delete: bool,
) -> i32 {
    if let Some(id) = handle {
        let kind = match kind.as_deref() {
            Some("post") => ReportKind::Post,
            Some("reply") => ReportKind::Reply,
            _ => {
                eprintln!("error: --handle requires --kind post|reply");
                return 1;
            }
        };
        if let Err(e) = desk.handle(kind, ReportId(id), delete).await {
            eprintln!("Error: {}", e);
            return 1;
        }
        println!("Report #{} handled{}", id, if delete { " (content deleted)" } else { "" });
    }
    if let Err(e) = desk.refresh().await {
        eprintln!("Error: {}", e);
        return 1;
    }
    let queue = desk.queue();
    println!("{} unhandled report(s)", queue.unhandled_total());
    for report in queue.audit_view() {
        let subject = match (&report.post, &report.reply) {
            (Some(post), _) => format!("post #{} '{}'", post.id, post.title),
            (_, Some(reply)) => format!("reply #{} in '{}'", reply.id, reply.post_title),
            _ => "unknown subject".to_string(),
        };
        println!(
            "#{:<4} {} — reported by {} {}{}",
            report.id,
            subject,
            report.reporter.first_name,
            report.reporter.last_name,
            if report.subject_deleted() { " [deleted]" } else { "" }
        );
    }
    0
}

async fn cmd_notifications(api: Arc<HttpForumApi>, watch: bool) -> i32 {
    let center = NotificationCenter::new(api);
    if let Err(e) = center.refresh().await {
        eprintln!("Error: {}", e);
        return 1;
    }
    for n in center.items() {
        println!("{} [{}] {}", if n.read { " " } else { "*" }, n.kind, n.text);
    }
    if watch {
        let pollers = center.start_polling();
        println!("Watching (Ctrl-C to stop)...");
        let _ = tokio::signal::ctrl_c().await;
        pollers.stop();
    }
    0
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ApiConfig::new(cli.base_url);
    if let Some(token) = cli.token {
        config = config.with_token(token);
    }
    let api = match HttpForumApi::new(config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let actor = Actor::new(ActorId(cli.actor), parse_role(&cli.role));

    let code = match cli.command {
        Commands::List {
            query,
            topic,
            uni,
            page,
        } => {
            let controller = DiscussionPage::new(Arc::clone(&api), actor);
            cmd_list(&controller, query, topic, uni, page).await
        }
        Commands::Show { id } => {
            let controller = DiscussionPage::new(Arc::clone(&api), actor);
            cmd_show(&controller, id).await
        }
        Commands::Post {
            title,
            summary,
            topic,
            body,
            uni,
            books,
        } => {
            let controller = DiscussionPage::new(Arc::clone(&api), actor);
            cmd_post(&controller, title, summary, topic, body, uni, books).await
        }
        Commands::Reports {
            handle,
            kind,
            delete,
        } => {
            let desk = ModerationDesk::new(Arc::clone(&api), actor);
            cmd_reports(&desk, handle, kind, delete).await
        }
        Commands::Notifications { watch } => cmd_notifications(api, watch).await,
    };
    std::process::exit(code);
}
