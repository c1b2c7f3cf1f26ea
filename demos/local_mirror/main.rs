//! Demonstrates the core end to end: parses the `spec.md` §6 CLI surface,
//! builds a [`ros3fs::Context`] over a local-directory-mirroring
//! [`ObjectStoreClient`], and prints the resulting tree. Stands in for the
//! (external) kernel adapter, which would instead dispatch `getattr` /
//! `readdir` / `open` / `read` to these same three operations.

mod store;

use std::sync::Arc;

use clap::Parser;
use ros3fs::config::{CliArgs, ResolvedConfig};
use ros3fs::context::{Context, ContextConfig};
use ros3fs::ObjectStoreClient;
use store::LocalMirrorStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = CliArgs::parse();
    let resolved = ResolvedConfig::resolve(cli)?;

    let client: Arc<dyn ObjectStoreClient> =
        Arc::new(LocalMirrorStore::new(resolved.cache_dir.join("mirrored")));

    let ctx = Context::init(
        ContextConfig {
            endpoint: resolved.endpoint,
            bucket_name: resolved.bucket_name,
            cache_dir: resolved.cache_dir,
            clear_cache: resolved.clear_cache,
            update_seconds: resolved.update_seconds,
        },
        client,
    )
    .await?;

    print_tree(&ctx, "/", 0).await;

    ctx.shutdown().await;
    Ok(())
}

fn print_tree<'a>(
    ctx: &'a Context,
    path: &'a str,
    depth: usize,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + 'a>> {
    Box::pin(async move {
        for child in ctx.read_directory(path).await {
            println!("{}{}", "  ".repeat(depth), child.name);
            let child_path = if path == "/" {
                format!("/{}", child.name)
            } else {
                format!("{path}/{}", child.name)
            };
            if child.kind == ros3fs::FileKind::Directory {
                print_tree(ctx, &child_path, depth + 1).await;
            }
        }
    })
}
