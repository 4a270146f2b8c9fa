use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use fieldforce_core::{AppError, AppResult};
use fieldforce_domain::ApprovalStatus;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000/api/proxy";

pub const USAGE: &str = "usage: fieldforce-console <command>
  whoami                              show the signed-in user and roles
  approvals [status] [page] [search]  list attendance requests
  counts                              attendance requests per status
  visits <start-date> [days]          visit assignment grid
  overview [view-query]               dashboard, e.g. 'view=employee&id=17'
  team [search]                       your direct reports";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_token: String,
    pub http_timeout: Duration,
    pub page_size: u32,
    pub search_debounce: Duration,
    pub preferences_path: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("FIELDFORCE_API_BASE_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let api_token = lookup("FIELDFORCE_API_TOKEN")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation("FIELDFORCE_API_TOKEN is required".to_owned()))?;

        let http_timeout_secs = parse_positive(&lookup, "FIELDFORCE_HTTP_TIMEOUT_SECS", 30)?;
        let page_size = parse_positive(&lookup, "FIELDFORCE_PAGE_SIZE", 10)?;
        let search_debounce_ms = parse_value(&lookup, "FIELDFORCE_SEARCH_DEBOUNCE_MS", 300_u64)?;
        let preferences_path = lookup("FIELDFORCE_PREFERENCES_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_base_url,
            api_token,
            http_timeout: Duration::from_secs(u64::from(http_timeout_secs)),
            page_size,
            search_debounce: Duration::from_millis(search_debounce_ms),
            preferences_path,
        })
    }
}

fn parse_value<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_positive<F>(lookup: &F, name: &str, default: u32) -> AppResult<u32>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_value(lookup, name, default)?;
    if value == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    WhoAmI,
    Approvals {
        status: Option<ApprovalStatus>,
        page: u32,
        search: Option<String>,
    },
    Counts,
    Visits {
        start: NaiveDate,
        days: u32,
    },
    Overview {
        view_query: String,
    },
    Team {
        search: Option<String>,
    },
}

impl Command {
    pub fn parse(args: &[String]) -> AppResult<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Err(AppError::Validation(USAGE.to_owned()));
        };

        match name.as_str() {
            "whoami" => Ok(Self::WhoAmI),
            "counts" => Ok(Self::Counts),
            "approvals" => {
                let status = rest
                    .first()
                    .filter(|value| !value.eq_ignore_ascii_case("all"))
                    .map(|value| value.parse::<ApprovalStatus>())
                    .transpose()?;
                let page = match rest.get(1) {
                    Some(value) => value.parse::<u32>().map_err(|error| {
                        AppError::Validation(format!("invalid page '{value}': {error}"))
                    })?,
                    None => 0,
                };
                let search = (rest.len() > 2).then(|| rest[2..].join(" "));
                Ok(Self::Approvals {
                    status,
                    page,
                    search,
                })
            }
            "visits" => {
                let start = rest.first().ok_or_else(|| {
                    AppError::Validation("visits requires a start date".to_owned())
                })?;
                let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|error| {
                    AppError::Validation(format!("invalid start date '{start}': {error}"))
                })?;
                let days = match rest.get(1) {
                    Some(value) => value.parse::<u32>().map_err(|error| {
                        AppError::Validation(format!("invalid day count '{value}': {error}"))
                    })?,
                    None => 7,
                };
                Ok(Self::Visits { start, days })
            }
            "overview" => Ok(Self::Overview {
                view_query: rest.first().cloned().unwrap_or_default(),
            }),
            "team" => Ok(Self::Team {
                search: (!rest.is_empty()).then(|| rest.join(" ")),
            }),
            other => Err(AppError::Validation(format!(
                "unknown command '{other}'\n{USAGE}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use chrono::NaiveDate;
    use fieldforce_core::AppError;
    use fieldforce_domain::ApprovalStatus;

    use super::{Command, ConsoleConfig};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        move |name| values.get(name).cloned()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = ConsoleConfig::from_lookup(lookup(&[("FIELDFORCE_API_TOKEN", "t")]));
        assert!(config.is_ok());
        let config = config.unwrap_or_else(|_| unreachable!());

        assert_eq!(config.api_base_url, "http://127.0.0.1:3000/api/proxy");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.preferences_path, None);
    }

    #[test]
    fn missing_token_is_rejected() {
        let config = ConsoleConfig::from_lookup(lookup(&[]));
        assert!(matches!(config, Err(AppError::Validation(message)) if message.contains("TOKEN")));
    }

    #[test]
    fn zero_page_size_names_the_variable() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            ("FIELDFORCE_API_TOKEN", "t"),
            ("FIELDFORCE_PAGE_SIZE", "0"),
        ]));
        assert!(matches!(
            config,
            Err(AppError::Validation(message)) if message.contains("FIELDFORCE_PAGE_SIZE")
        ));
    }

    #[test]
    fn approvals_arguments_are_optional() {
        assert_eq!(
            Command::parse(&args(&["approvals"])),
            Ok(Command::Approvals {
                status: None,
                page: 0,
                search: None
            })
        );
        assert_eq!(
            Command::parse(&args(&["approvals", "approved", "2", "anita", "rao"])),
            Ok(Command::Approvals {
                status: Some(ApprovalStatus::Approved),
                page: 2,
                search: Some("anita rao".to_owned())
            })
        );
    }

    #[test]
    fn visits_requires_a_valid_start_date() {
        assert!(Command::parse(&args(&["visits"])).is_err());
        assert!(Command::parse(&args(&["visits", "03/02/2026"])).is_err());
        assert_eq!(
            Command::parse(&args(&["visits", "2026-03-02", "14"])),
            Ok(Command::Visits {
                start: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or_default(),
                days: 14
            })
        );
    }

    #[test]
    fn unknown_command_prints_usage() {
        assert!(matches!(
            Command::parse(&args(&["deploy"])),
            Err(AppError::Validation(message)) if message.contains("usage")
        ));
    }
}
