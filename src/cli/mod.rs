//! Command-line surface: argument parsing and dispatch.

use clap::{Parser, Subcommand};

use crate::entities::pathway::{self, ErrorPolicy, FilterMap, PageRequest};
use crate::error::OmicsBrowseError;
use crate::query::SortOrder;
use crate::render;
use crate::sources::omics::OmicsClient;

pub mod health;

#[derive(Parser, Debug)]
#[command(
    name = "omicsbrowse",
    version,
    about = "Browse KEGG pathway-to-gene association tables from an omics backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List pathway-gene associations as a paginated table
    Pathways {
        /// 1-based page number
        #[arg(long)]
        page: Option<u32>,

        /// Rows per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Substring filter on a column, repeatable: --filter gene_symbol=BRCA1
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,

        /// Sort column, optionally with a direction: pathway_id or pathway_id:descend
        #[arg(long, value_name = "FIELD[:DIRECTION]")]
        sort: Option<String>,

        /// Fail instead of returning an empty page when the backend errors
        #[arg(long)]
        strict: bool,

        /// Print the page as pretty JSON instead of markdown
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Query the sibling omics-data endpoint with raw key=value parameters
    OmicsData {
        /// Query parameter, repeatable: --param organism=human
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Check backend connectivity
    Health {
        /// Print the report as pretty JSON instead of markdown
        #[arg(long, short = 'j')]
        json: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Pathways {
            page,
            page_size,
            filters,
            sort,
            strict,
            json,
        } => {
            let request = PageRequest {
                current: page,
                page_size,
                filters: parse_key_value_args(&filters)?,
            };
            let sort = parse_sort_arg(sort.as_deref())?;
            let policy = if strict {
                ErrorPolicy::Propagate
            } else {
                ErrorPolicy::EmptyPage
            };
            let result = pathway::fetch_page(&request, &sort, &FilterMap::new(), policy).await?;
            if json {
                Ok(render::json::to_pretty(&result)?)
            } else {
                Ok(render::markdown::pathway_page_markdown(
                    &result, page, page_size,
                )?)
            }
        }
        Commands::OmicsData { params } => {
            let params = parse_key_value_args(&params)?;
            let client = OmicsClient::new()?;
            let page = client.get_omics_data(&params).await?;
            Ok(render::json::to_pretty(&page)?)
        }
        Commands::Health { json } => {
            let report = health::check().await?;
            if json {
                Ok(render::json::to_pretty(&report)?)
            } else {
                Ok(report.to_markdown())
            }
        }
    }
}

fn parse_key_value_args(args: &[String]) -> Result<Vec<(String, String)>, OmicsBrowseError> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    OmicsBrowseError::InvalidArgument(format!(
                        "Expected KEY=VALUE, got {arg:?} (example: gene_symbol=BRCA1)"
                    ))
                })
        })
        .collect()
}

/// `field` sorts ascending; `field:descend` flips it. Blank means unsorted.
fn parse_sort_arg(arg: Option<&str>) -> Result<Vec<(String, SortOrder)>, OmicsBrowseError> {
    let Some(raw) = arg.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };
    let (field, order) = match raw.split_once(':') {
        Some((field, direction)) => (field, parse_sort_order(direction)?),
        None => (raw, SortOrder::Ascend),
    };
    Ok(vec![(field.to_string(), order)])
}

fn parse_sort_order(raw: &str) -> Result<SortOrder, OmicsBrowseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "asc" | "ascend" | "ascending" => Ok(SortOrder::Ascend),
        "desc" | "descend" | "descending" => Ok(SortOrder::Descend),
        _ => Err(OmicsBrowseError::InvalidArgument(format!(
            "Unknown sort direction {raw:?}. Use ascend or descend."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_args_split_on_first_equals() {
        let parsed = parse_key_value_args(&[
            "gene_symbol=BRCA1".to_string(),
            "pathway_name=a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                ("gene_symbol".to_string(), "BRCA1".to_string()),
                ("pathway_name".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn key_value_args_keep_empty_values() {
        let parsed = parse_key_value_args(&["gene_symbol=".to_string()]).unwrap();
        assert_eq!(parsed, vec![("gene_symbol".to_string(), String::new())]);
    }

    #[test]
    fn key_value_args_without_equals_are_rejected() {
        let err = parse_key_value_args(&["BRCA1".to_string()]).unwrap_err();
        assert!(matches!(err, OmicsBrowseError::InvalidArgument(_)));
        assert!(err.to_string().contains("BRCA1"));
    }

    #[test]
    fn sort_arg_defaults_to_ascending() {
        let sort = parse_sort_arg(Some("pathway_id")).unwrap();
        assert_eq!(sort, vec![("pathway_id".to_string(), SortOrder::Ascend)]);
    }

    #[test]
    fn sort_arg_parses_explicit_direction() {
        let sort = parse_sort_arg(Some("pathway_id:descend")).unwrap();
        assert_eq!(sort, vec![("pathway_id".to_string(), SortOrder::Descend)]);
        let sort = parse_sort_arg(Some("gene_symbol:ASC")).unwrap();
        assert_eq!(sort, vec![("gene_symbol".to_string(), SortOrder::Ascend)]);
    }

    #[test]
    fn missing_or_blank_sort_arg_means_unsorted() {
        assert!(parse_sort_arg(None).unwrap().is_empty());
        assert!(parse_sort_arg(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn unknown_sort_direction_is_rejected() {
        let err = parse_sort_arg(Some("pathway_id:sideways")).unwrap_err();
        assert!(matches!(err, OmicsBrowseError::InvalidArgument(_)));
        assert!(err.to_string().contains("sideways"));
    }
}
