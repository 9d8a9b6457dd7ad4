// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo command: walk through the basic list scenario against the daemon

use clap::Args;

use crate::client::{ClientError, DaemonClient};

#[derive(Args)]
pub struct DemoArgs {
    /// Prefix for the two demo lists (`<prefix>A` and `<prefix>B`)
    #[arg(long, default_value = "lista_")]
    pub prefix: String,
}

pub async fn handle(client: &mut DaemonClient, args: DemoArgs) -> Result<(), ClientError> {
    let list_a = format!("{}A", args.prefix);
    let list_b = format!("{}B", args.prefix);

    println!("Connected to {}", client.addr());

    println!("Appending 10 and 20 to '{}'", list_a);
    client.append(&list_a, 10).await?;
    client.append(&list_a, 20).await?;

    println!("Appending 99 to '{}'", list_b);
    client.append(&list_b, 99).await?;

    println!("Size of '{}': {}", list_a, client.size(&list_a).await?);
    println!("Size of '{}': {}", list_b, client.size(&list_b).await?);

    println!(
        "Value at index 1 of '{}': {}",
        list_a,
        client.get(&list_a, 1).await?
    );

    match client.get(&list_a, 99).await {
        Err(ClientError::List(e)) => println!("Expected error for index 99: {}", e),
        Err(e) => return Err(e),
        Ok(value) => println!("Index 99 unexpectedly returned {}", value),
    }

    println!("Removed from '{}': {}", list_a, client.remove(&list_a).await?);
    println!("New size of '{}': {}", list_a, client.size(&list_a).await?);

    println!("Done");
    Ok(())
}
