//! `lockstep list`: print the scenario catalog.

use std::fmt::Write;

use lockstep_bench::{Catalog, Selection};

use crate::{GlobalArgs, ListArgs};

/// Runs the `lockstep list` command.
pub fn run(args: &ListArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_suite()?;
    let catalog = Catalog::from_config(&config)?.select(&Selection {
        circuit: args.circuit,
        filter: None,
    });
    print!("{}", render(&catalog));
    if !global.quiet {
        eprintln!(
            "   {} scenario(s) in {} parameter set(s)",
            catalog.len(),
            catalog.entries().len()
        );
    }
    Ok(0)
}

/// One line per parameter set, followed by its indexed scenarios.
fn render(catalog: &Catalog) -> String {
    let mut out = String::new();
    for entry in catalog.entries() {
        let _ = writeln!(out, "{}", entry.target.label());
        for scenario in &entry.scenarios {
            let _ = writeln!(out, "  {:>4}  {}", scenario.index, scenario.name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_bench::{Circuit, Target};

    #[test]
    fn render_edge_only() {
        let catalog = Catalog::from_targets(vec![Target::Edge]);
        assert_eq!(
            render(&catalog),
            "edge\n     0  posedge\n     1  negedge\n     2  random\n"
        );
    }

    #[test]
    fn render_keeps_catalog_indices() {
        let catalog = Catalog::from_config(&Default::default())
            .unwrap()
            .select(&Selection {
                circuit: Some(Circuit::Edge),
                filter: None,
            });
        let text = render(&catalog);
        assert!(text.starts_with("edge\n"));
        let first_index: u64 = text.lines().nth(1).unwrap().split_whitespace().next().unwrap().parse().unwrap();
        assert!(first_index > 0);
    }

    #[test]
    fn render_empty_catalog() {
        assert_eq!(render(&Catalog::default()), "");
    }
}
