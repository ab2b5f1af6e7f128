use std::error::Error;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::command::{ConsoleCommand, USAGE};
use crate::link::{CloudLink, Flow};
use crate::settings::Settings;
use crate::status::StatusBoard;

pub mod command;
pub mod error;
pub mod link;
pub mod settings;
pub mod status;

pub fn create_link(settings: &Settings) -> CloudLink {
    CloudLink::new(
        settings.cloud.edge_address(),
        settings.cloud.reconnect_delay(),
        settings.rule.clone(),
        StatusBoard::new(&settings.cloud.status_log),
    )
}

pub async fn run(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let rule = &settings.rule;
    println!("===== Curtain Control System - Cloud Management =====");
    println!(
        "Current rule: {} ({}-{}), Enabled: {}",
        rule.id, rule.window_start, rule.window_end, rule.enabled
    );

    let link = create_link(settings);
    let connection = link.start();

    println!("\n{USAGE}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ConsoleCommand::parse(&line) {
            Ok(command) => {
                if link.apply(command).await == Flow::Exit {
                    break;
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    connection.abort();
    link.close().await;

    Ok(())
}
