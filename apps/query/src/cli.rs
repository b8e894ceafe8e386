use clap::{Args, Parser, Subcommand};
use vellum_application::ViewQueryRequest;

#[derive(Parser, Debug)]
#[command(
    name = "vellum-query",
    version,
    about = "Compile, explain and run saved content views"
)]
pub struct VellumQueryCli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the SELECT and COUNT statements for the configured provider.
    Explain(ViewQueryArgs),
    /// Run a view against Postgres and print the page as JSON.
    Run(ViewQueryArgs),
    /// Print a view's compiled portable filter.
    Compile {
        /// View identifier or developer name.
        view: String,
    },
}

#[derive(Args, Debug)]
pub struct ViewQueryArgs {
    /// View identifier or developer name.
    pub view: String,

    /// Free-text search term.
    #[arg(long)]
    pub search: Option<String>,

    /// Search column overriding the view's; repeatable.
    #[arg(long = "search-column")]
    pub search_columns: Vec<String>,

    /// Extra portable filter ANDed with the view filter; repeatable.
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Order such as `price desc, title`.
    #[arg(long)]
    pub order_by: Option<String>,

    /// One-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size; zero uses the configured default.
    #[arg(long, default_value_t = 0)]
    pub page_size: u32,
}

impl ViewQueryArgs {
    pub fn to_request(&self) -> ViewQueryRequest {
        ViewQueryRequest {
            search_term: self.search.clone(),
            search_columns: self.search_columns.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            page_size: self.page_size,
            page_number: self.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, VellumQueryCli};

    #[test]
    fn parses_repeated_filters_and_paging() {
        let cli = VellumQueryCli::try_parse_from([
            "vellum-query",
            "explain",
            "premium",
            "--filter",
            "(price gt 10)",
            "--filter",
            "has(tags, 'rust')",
            "--search-column",
            "title",
            "--page",
            "2",
        ])
        .unwrap_or_else(|_| unreachable!());

        let Command::Explain(args) = cli.command else {
            unreachable!()
        };
        let request = args.to_request();
        assert_eq!(request.filters.len(), 2);
        assert_eq!(request.search_columns, vec!["title".to_owned()]);
        assert_eq!(request.page_number, 2);
        assert_eq!(request.page_size, 0);
    }

    #[test]
    fn compile_takes_only_a_view() {
        let cli = VellumQueryCli::try_parse_from(["vellum-query", "compile", "premium"])
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(cli.command, Command::Compile { view } if view == "premium"));
    }
}
