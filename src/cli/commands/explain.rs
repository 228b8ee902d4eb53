//! cli::commands::explain
//!
//! Show how per-type directives resolve, without contacting any service.
//!
//! When no detail type is given, the detail types configured for the
//! master are used.

use anyhow::Result;

use super::load_store;
use crate::cli::Context;
use crate::core::config::ConfigResolver;
use crate::engine::directives::{
    algorithm_keys, detail_types_keys, mapping_prefixes, parse_type_list, DEFAULT_ALGORITHM,
};
use crate::mapping::{ExpressionEvaluator, ScriptEvaluator};

/// Print the resolved directives for a type combination.
pub fn explain(ctx: &Context, master_types: &[String], detail_types: &[String]) -> Result<()> {
    let store = load_store(ctx)?;
    let resolver = ConfigResolver::new(&store);

    println!("Master types: {}", display_list(master_types));

    let details_keys = detail_types_keys(master_types);
    let configured = resolver.resolve_one(&details_keys, None)?;
    println!();
    println!("Detail types");
    print_candidates(&details_keys);
    match &configured {
        Some(list) => println!("  resolved:   {}", list),
        None => println!("  resolved:   (none, the master is checked as its own detail)"),
    }

    let detail_types: Vec<String> = if detail_types.is_empty() {
        configured.as_deref().map(parse_type_list).unwrap_or_default()
    } else {
        detail_types.to_vec()
    };
    println!();
    println!("Detail: {}", display_list(&detail_types));

    let alg_keys = algorithm_keys(&detail_types);
    let algorithm = resolver.resolve_one(&alg_keys, None)?;
    println!();
    println!("Algorithm");
    print_candidates(&alg_keys);
    match algorithm {
        Some(alg) => println!("  resolved:   {}", alg),
        None => println!("  resolved:   {} (default)", DEFAULT_ALGORITHM),
    }

    let prefixes = mapping_prefixes(master_types, &detail_types);
    let rules = resolver.resolve_bundle(&prefixes)?;
    println!();
    println!("Mapping rules");
    print_candidates(&prefixes);
    if rules.is_empty() {
        println!("  (no rules)");
    }

    let evaluator = ScriptEvaluator::new();
    let mut invalid = 0;
    for (property, expression) in &rules {
        match evaluator.check_syntax(expression) {
            Ok(()) => println!("  {} = {}", property, expression),
            Err(e) => {
                invalid += 1;
                println!("  {} = {}  [invalid: {}]", property, expression, e);
            }
        }
    }

    if invalid > 0 && !ctx.quiet {
        eprintln!();
        eprintln!(
            "warning: {} rule(s) will be skipped because they do not parse",
            invalid
        );
    }

    Ok(())
}

fn print_candidates(keys: &[String]) {
    if keys.is_empty() {
        println!("  candidates: (none)");
        return;
    }
    for (i, key) in keys.iter().enumerate() {
        let label = if i == 0 { "candidates:" } else { "" };
        println!("  {:<11} {}", label, key);
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
