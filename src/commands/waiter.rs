use tracing::info;

use super::{print_json, Ctx};
use crate::cli::WaiterCommand;
use crate::routes::Route;
use crate::waiter::{WaiterBoard, WaiterPoller};

pub(super) async fn run(ctx: &Ctx, cmd: WaiterCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Waiter)?;
    let api = ctx.api.as_ref();

    match cmd {
        WaiterCommand::Board => {
            let mut board = WaiterBoard::new();
            board.refresh(api).await?;
            print_json(&board)
        }
        WaiterCommand::Serve { table_id } => {
            let mut board = WaiterBoard::new();
            board.refresh(api).await?;
            board.serve(api, table_id).await?;
            print_json(&board)
        }
        WaiterCommand::Watch { count } => watch(ctx, count).await,
    }
}

/// Print the board after every poll until interrupted or `count` is reached.
async fn watch(ctx: &Ctx, count: Option<u64>) -> anyhow::Result<()> {
    let poller = WaiterPoller::spawn(ctx.api.clone(), ctx.cfg.waiter_poll_interval);
    let mut rx = poller.subscribe();
    let mut seen = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping waiter board");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let board = rx.borrow_and_update().clone();
                // Refresh failures are part of the board; keep polling.
                println!("{}", serde_json::to_string(&board)?);
                seen += 1;
                if count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
        }
    }
    poller.stop().await;
    Ok(())
}
