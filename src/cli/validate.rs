//! Validate command - load the rules file and list what it enforces

use crate::cli::style::{CHECK, CROSS, Stylize};
use anstream::{eprintln, println};
use merge_gate::config::{GateConfig, RestrictionRule, load_config};
use merge_gate::report::{EXIT_ERROR, EXIT_PASS};
use std::path::Path;

/// Run the validate command, returning the process exit status
pub fn run_validate(path: &Path) -> i32 {
    match load_config(path) {
        Ok(config) => {
            print_rules(path, &config);
            EXIT_PASS
        }
        Err(e) => {
            eprintln!("{} {e}", format!("{CROSS} Invalid config:").failure());
            EXIT_ERROR
        }
    }
}

fn print_rules(path: &Path, config: &GateConfig) {
    println!(
        "{} {}",
        format!("{CHECK} Config valid:").success(),
        path.display().emphasis()
    );
    println!();

    if config.rules.is_empty() {
        println!("{}", "No restricted branches; every pull request passes".muted());
        return;
    }

    println!("{}:", "Rules (first match wins)".emphasis());
    for (i, rule) in config.rules.iter().enumerate() {
        println!("  {}. {} {}", i + 1, rule.name, format!("[{}]", rule.pattern).muted());
        for line in describe(rule) {
            println!("       {line}");
        }
    }
}

fn describe(rule: &RestrictionRule) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(ref approvals) = rule.approvals {
        match approvals.group {
            Some(ref group) => lines.push(format!(
                "approvals: at least {} from group '{group}'",
                approvals.min
            )),
            None => lines.push(format!("approvals: at least {}", approvals.min)),
        }
    }
    if let Some(ref ticket) = rule.ticket {
        if ticket.checks_status() {
            lines.push(format!("ticket status: {}", ticket.accepted_statuses.join(", ")));
        }
        if !ticket.required_fields.is_empty() {
            lines.push(format!("ticket fields: {}", ticket.required_fields.join(", ")));
        }
        if let Some(ref approval) = ticket.approval_ticket {
            lines.push(format!("approval ticket: {approval} (every commit ticket linked)"));
        }
    }
    lines
}
