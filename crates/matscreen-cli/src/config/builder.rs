use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileOutputConfig, FileSubstitutionConfig};
use super::models::{GenerateAppConfig, OutputOptions, ScreenAppConfig};
use crate::cli::{ConfigArgs, GenerateArgs, ScreenArgs};
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::parser;
use matscreen::core::io::seeds::SeedMaterial;
use matscreen::engine::config as core_config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub fn build_screen_config(
    options: &ConfigArgs,
    args: &ScreenArgs,
    data_manager: &DataManager,
) -> Result<ScreenAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(options)?;

    let data_file = file_config.data.take().unwrap_or_default();
    let stoichiometry_file = file_config.stoichiometry.take().unwrap_or_default();

    let source = match args.source {
        Some(source) => source.into(),
        None => stoichiometry_file
            .source
            .as_deref()
            .map(parse_setting::<core_config::RatioSource>)
            .transpose()?
            .unwrap_or(defaults.ratio_source),
    };
    let order_sensitive = if args.unordered {
        false
    } else {
        stoichiometry_file
            .order_sensitive
            .unwrap_or(defaults.order_sensitive)
    };

    let known_materials_path = resolve_optional(
        args.known.as_deref().or(data_file.known_materials.as_deref()),
        "known-materials",
        data_manager,
    )?;

    let core_config = core_config::ScreenConfigBuilder::new()
        .candidates_path(args.input.clone())
        .known_materials_path(known_materials_path)
        .source(source)
        .order_sensitive(order_sensitive)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(ScreenAppConfig {
        core_config,
        output: merge_output(options, file_config.output.take(), &defaults),
    })
}

pub fn build_generate_config(
    options: &ConfigArgs,
    args: &GenerateArgs,
    data_manager: &DataManager,
) -> Result<GenerateAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(options)?;

    let data_file = file_config.data.take().unwrap_or_default();
    let substitution_file = file_config.substitution.take().unwrap_or_default();

    let seeds = match (&args.seed, &args.seeds) {
        (Some(formula), _) => {
            let seed = SeedMaterial::parse(formula, &args.sites.join(";")).map_err(|e| {
                CliError::Argument(format!("Invalid seed '{}': {}", formula, e))
            })?;
            if seed.sites.is_empty() {
                return Err(CliError::Argument(
                    "--seed requires at least one --site (e.g., --site Pb:+2:VIII).".to_string(),
                ));
            }
            core_config::SeedSource::Inline(vec![seed])
        }
        (None, Some(path)) => core_config::SeedSource::Table(path.clone()),
        (None, None) => {
            return Err(CliError::Argument(
                "Either --seed or --seeds is required.".to_string(),
            ));
        }
    };

    let reference_table_path = resolve_path_or_logical_name(
        args.reference.as_deref(),
        data_file.reference_table.as_deref(),
        &defaults.reference_table,
        "reference-table",
        data_manager,
    )?;
    let known_materials_path = resolve_optional(
        args.known.as_deref().or(data_file.known_materials.as_deref()),
        "known-materials",
        data_manager,
    )?;

    let criteria = merge_criteria(args, substitution_file, &defaults)?;

    let core_config = core_config::GenerateConfigBuilder::new()
        .reference_table_path(reference_table_path)
        .known_materials_path(known_materials_path)
        .seeds(seeds)
        .criteria(criteria)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(GenerateAppConfig {
        core_config,
        output: merge_output(options, file_config.output.take(), &defaults),
    })
}

fn load_file_config(options: &ConfigArgs) -> Result<FileConfig> {
    let file_config = match &options.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    apply_set_values(file_config, &options.set_values)
}

fn merge_criteria(
    args: &GenerateArgs,
    file: FileSubstitutionConfig,
    defaults: &DefaultsConfig,
) -> Result<core_config::SubstitutionCriteria> {
    let window = match (args.tolerance, args.percent) {
        (Some(tolerance), _) => core_config::PropertyWindow::Absolute { tolerance },
        (None, Some(percent)) => core_config::PropertyWindow::Relative { percent },
        (None, None) => match (file.tolerance, file.percent) {
            (Some(_), Some(_)) => {
                return Err(CliError::Config(
                    "`substitution.tolerance` and `substitution.percent` are mutually exclusive."
                        .to_string(),
                ));
            }
            (Some(tolerance), None) => core_config::PropertyWindow::Absolute { tolerance },
            (None, Some(percent)) => core_config::PropertyWindow::Relative { percent },
            (None, None) => core_config::PropertyWindow::Relative {
                percent: defaults.percent,
            },
        },
    };

    let bound = if args.exclusive {
        core_config::ToleranceBound::Exclusive
    } else {
        file.bound
            .as_deref()
            .map(parse_setting::<core_config::ToleranceBound>)
            .transpose()?
            .unwrap_or(defaults.bound)
    };
    let match_coordination = if args.any_coordination {
        false
    } else {
        file.match_coordination.unwrap_or(defaults.match_coordination)
    };
    let include_rejected =
        args.include_rejected || file.include_rejected.unwrap_or(defaults.include_rejected);
    let property = args
        .property
        .clone()
        .or(file.property)
        .unwrap_or_else(|| defaults.property.clone());

    core_config::SubstitutionCriteriaBuilder::new()
        .window(window)
        .bound(bound)
        .match_coordination(match_coordination)
        .include_rejected(include_rejected)
        .property(property)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn merge_output(
    options: &ConfigArgs,
    file: Option<FileOutputConfig>,
    defaults: &DefaultsConfig,
) -> OutputOptions {
    let file = file.unwrap_or_default();
    OutputOptions {
        results_dir: options
            .results_dir
            .clone()
            .or(file.results_dir)
            .unwrap_or_else(|| defaults.results_dir.clone()),
        plot: !options.no_plot && file.plot.unwrap_or(defaults.plot),
    }
}

fn parse_setting<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = core_config::ConfigError>,
{
    value.parse().map_err(|e: core_config::ConfigError| CliError::Config(e.to_string()))
}

fn resolve_optional(
    name_or_path: Option<&str>,
    kind: &str,
    data_manager: &DataManager,
) -> Result<Option<PathBuf>> {
    name_or_path
        .map(|value| resolve_path_or_logical_name(Some(value), None, value, kind, data_manager))
        .transpose()
}

fn resolve_path_or_logical_name(
    cli_arg: Option<&str>,
    file_arg: Option<&str>,
    default_arg: &str,
    kind: &str,
    data_manager: &DataManager,
) -> Result<PathBuf> {
    let name_or_path = cli_arg.or(file_arg).unwrap_or(default_arg);

    let path = Path::new(name_or_path);
    let looks_like_path = path.is_absolute()
        || name_or_path.contains(['/', '\\'])
        || path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if looks_like_path {
        if !path.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Provided path does not exist: {}", name_or_path),
            )));
        }
        return Ok(path.to_path_buf());
    }

    let parsed_name = parser::parse_logical_name(name_or_path, kind)
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let resolved = data_manager.resolve_logical_name(&parsed_name);
    if !resolved.exists() {
        return Err(CliError::Data(format!(
            "Resolved data file does not exist: {:?}.\nHint: Place the table there, or point 'matscreen data set-path' at a directory that contains it.",
            resolved
        )));
    }
    Ok(resolved)
}

fn set_error(key: &str, value: &str, expected: &str) -> CliError {
    CliError::Config(format!("Invalid {} value for {}: {}", expected, key, value))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let value_str = value_str.trim();
        let parse_bool = || {
            value_str
                .parse::<bool>()
                .map_err(|_| set_error(key, value_str, "boolean"))
        };
        let parse_float = || {
            value_str
                .parse::<f64>()
                .map_err(|_| set_error(key, value_str, "float"))
        };

        match key {
            "data.reference-table" => {
                config.data.get_or_insert_with(Default::default).reference_table =
                    Some(value_str.to_string());
            }
            "data.known-materials" => {
                config.data.get_or_insert_with(Default::default).known_materials =
                    Some(value_str.to_string());
            }
            "stoichiometry.source" => {
                config.stoichiometry.get_or_insert_with(Default::default).source =
                    Some(value_str.to_string());
            }
            "stoichiometry.order-sensitive" => {
                config
                    .stoichiometry
                    .get_or_insert_with(Default::default)
                    .order_sensitive = Some(parse_bool()?);
            }
            "substitution.match-coordination" => {
                config
                    .substitution
                    .get_or_insert_with(Default::default)
                    .match_coordination = Some(parse_bool()?);
            }
            "substitution.property" => {
                config.substitution.get_or_insert_with(Default::default).property =
                    Some(value_str.to_string());
            }
            "substitution.tolerance" => {
                let substitution = config.substitution.get_or_insert_with(Default::default);
                substitution.tolerance = Some(parse_float()?);
                substitution.percent = None;
            }
            "substitution.percent" => {
                let substitution = config.substitution.get_or_insert_with(Default::default);
                substitution.percent = Some(parse_float()?);
                substitution.tolerance = None;
            }
            "substitution.bound" => {
                config.substitution.get_or_insert_with(Default::default).bound =
                    Some(value_str.to_string());
            }
            "substitution.include-rejected" => {
                config
                    .substitution
                    .get_or_insert_with(Default::default)
                    .include_rejected = Some(parse_bool()?);
            }
            "output.results-dir" => {
                config.output.get_or_insert_with(Default::default).results_dir =
                    Some(PathBuf::from(value_str));
            }
            "output.plot" => {
                config.output.get_or_insert_with(Default::default).plot = Some(parse_bool()?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
