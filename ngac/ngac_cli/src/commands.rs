//! Query commands.

use anyhow::Context;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::process::ExitCode;

use ngac_core::model::OperationSet;
use ngac_pdp::Pdp;

/// Whether `user` holds every operation of `ops` on `target`. Exits with 1
/// when it does not.
pub fn check(
    pdp: &Pdp,
    user: &str,
    process: Option<&str>,
    target: &str,
    ops: Vec<String>,
    as_json: bool,
) -> anyhow::Result<ExitCode> {
    let ops = OperationSet::from(ops);
    let allowed = pdp
        .decider()
        .check(user, process, target, &ops)
        .with_context(|| format!("cannot check {} on {}", user, target))?;

    if as_json {
        print_json(&json!({
            "user": user,
            "target": target,
            "operations": ops,
            "allowed": allowed,
        }))?;
    } else {
        println!("{}", if allowed { "allowed" } else { "denied" });
    }
    Ok(if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

pub fn list(
    pdp: &Pdp,
    user: &str,
    process: Option<&str>,
    target: &str,
    as_json: bool,
) -> anyhow::Result<ExitCode> {
    let ops = pdp
        .decider()
        .list(user, process, target)
        .with_context(|| format!("cannot list operations of {} on {}", user, target))?;

    if as_json {
        print_json(&ops)?;
    } else {
        println!("{}", ops);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn explain(pdp: &Pdp, user: &str, target: &str, as_json: bool) -> anyhow::Result<ExitCode> {
    let explain = pdp
        .auditor()
        .explain(user, target)
        .with_context(|| format!("cannot explain {} on {}", user, target))?;

    if as_json {
        print_json(&explain)?;
    } else {
        print!("{}", explain);
    }
    Ok(ExitCode::SUCCESS)
}

/// Every user with access to `target`.
pub fn acl(
    pdp: &Pdp,
    target: &str,
    process: Option<&str>,
    as_json: bool,
) -> anyhow::Result<ExitCode> {
    let acl = pdp
        .decider()
        .generate_acl(target, process)
        .with_context(|| format!("cannot build the access list of {}", target))?;
    print_table(acl, as_json)
}

/// Every node `user` has access to.
pub fn capabilities(
    pdp: &Pdp,
    user: &str,
    process: Option<&str>,
    as_json: bool,
) -> anyhow::Result<ExitCode> {
    let capabilities = pdp
        .decider()
        .capability_list(user, process)
        .with_context(|| format!("cannot list the capabilities of {}", user))?;
    print_table(capabilities, as_json)
}

fn print_table(table: HashMap<String, OperationSet>, as_json: bool) -> anyhow::Result<ExitCode> {
    let sorted: BTreeMap<String, OperationSet> = table.into_iter().collect();
    if as_json {
        print_json(&sorted)?;
    } else {
        for (name, ops) in &sorted {
            println!("{}: {}", name, ops);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
