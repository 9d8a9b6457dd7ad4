// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! List commands: append, remove, get, size

use std::fmt;

use serde::Serialize;

use crate::client::{ClientError, DaemonClient};
use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize)]
struct Appended<'a> {
    list_id: &'a str,
    value: i64,
}

impl fmt::Display for Appended<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Appended {} to {}", self.value, self.list_id)
    }
}

#[derive(Debug, Serialize)]
struct Value {
    value: i64,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Serialize)]
struct Size {
    size: usize,
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.size)
    }
}

pub async fn append(
    client: &mut DaemonClient,
    list_id: &str,
    value: i64,
    format: OutputFormat,
) -> Result<(), ClientError> {
    client.append(list_id, value).await?;
    output::print(&Appended { list_id, value }, format);
    Ok(())
}

pub async fn remove(
    client: &mut DaemonClient,
    list_id: &str,
    format: OutputFormat,
) -> Result<(), ClientError> {
    let value = client.remove(list_id).await?;
    output::print(&Value { value }, format);
    Ok(())
}

pub async fn get(
    client: &mut DaemonClient,
    list_id: &str,
    index: i64,
    format: OutputFormat,
) -> Result<(), ClientError> {
    let value = client.get(list_id, index).await?;
    output::print(&Value { value }, format);
    Ok(())
}

pub async fn size(
    client: &mut DaemonClient,
    list_id: &str,
    format: OutputFormat,
) -> Result<(), ClientError> {
    let size = client.size(list_id).await?;
    output::print(&Size { size }, format);
    Ok(())
}
