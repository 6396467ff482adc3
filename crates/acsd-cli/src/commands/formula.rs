use crate::cli::FormulaArgs;
use crate::error::Result;
use acsd::core::chem::formula::parse_formula;
use tracing::info;

pub fn run(args: FormulaArgs) -> Result<()> {
    info!("Parsing formula '{}'", args.formula);
    let counts = parse_formula(&args.formula)?;
    println!("With hydrogens:    {}", counts);
    println!("Without hydrogens: {}", counts.without("H"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn valid_formula_is_accepted() {
        let result = run(FormulaArgs {
            formula: "C10 H8 N2 O2,2(H2 O1)".to_string(),
        });
        assert!(result.is_ok());
    }

    #[test]
    fn unclosed_group_is_a_formula_error() {
        let result = run(FormulaArgs {
            formula: "C6(H6".to_string(),
        });
        assert!(matches!(result, Err(CliError::Formula(_))));
    }
}
