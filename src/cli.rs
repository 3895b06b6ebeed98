use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "cadcon", about = "Script console for an in-memory CAD session", version)]
#[command(group(ArgGroup::new("mode").args(["run", "list_templates", "show_template"]).multiple(false)))]
pub struct Cli {
    /// Start without an active design (scripts see `design` and `rootComp` as `()`).
    #[arg(long = "no-design")]
    pub no_design: bool,

    /// Name of the document opened at start.
    #[arg(long)]
    pub document: Option<String>,

    /// List the bundled code templates.
    #[arg(short = 'l', long = "list-templates", visible_alias = "lt")]
    pub list_templates: bool,

    /// Print a template's script.
    #[arg(long = "show-template", value_name = "NAME")]
    pub show_template: Option<String>,

    /// Run one script headlessly and exit; "-" reads it from stdin.
    #[arg(long, value_name = "FILE")]
    pub run: Option<PathBuf>,

    /// With --run, print the result report as JSON.
    #[arg(long, requires = "run")]
    pub json: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_are_exclusive() {
        assert!(Cli::try_parse_from(["cadcon", "--run", "a.rhai", "--list-templates"]).is_err());
        assert!(Cli::try_parse_from(["cadcon", "--json"]).is_err());
    }

    #[test]
    fn run_with_json_and_document() {
        let cli = Cli::try_parse_from(["cadcon", "--run", "-", "--json", "--document", "Part"]).unwrap();
        assert_eq!(cli.run.as_deref(), Some(std::path::Path::new("-")));
        assert!(cli.json);
        assert_eq!(cli.document.as_deref(), Some("Part"));
        assert!(!cli.no_design);
    }
}
