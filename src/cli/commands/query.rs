//! `compose` and `run` command handlers

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use colored::*;
use log::info;
use serde_json::Value;

use crate::api::constants;
use crate::api::model::{List, ListItem};
use crate::api::{ExecutionContext, Field, HttpExecutor, Queryable, Resource, Transport};
use crate::config::Config;
use crate::predicate::parse_predicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    /// Lists of the site
    Lists,
    /// Items of the list named by --list
    Items,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Remote protocol (defaults to the configured transport)
    #[arg(short, long)]
    pub transport: Option<Transport>,

    #[arg(short, long, value_enum, default_value = "lists")]
    pub resource: ResourceKind,

    /// List title, required for --resource items unless --path is given
    #[arg(long)]
    pub list: Option<String>,

    /// Collection path relative to the api root, overriding the default
    #[arg(long)]
    pub path: Option<String>,

    /// Predicate, e.g. "Title.contains('Doc') && !Hidden"; repeat to AND
    #[arg(short = 'w', long = "where")]
    pub filters: Vec<String>,

    /// Members to load, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Members to expand, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    pub expand: Vec<String>,

    /// Sort key as Member or Member:desc; repeatable
    #[arg(short, long)]
    pub orderby: Vec<String>,

    #[arg(long)]
    pub top: Option<u32>,

    #[arg(long)]
    pub skip: Option<u32>,
}

fn resolve_field<F: Field>(name: &str) -> Result<F> {
    F::all()
        .iter()
        .copied()
        .find(|field| field.name().eq_ignore_ascii_case(name.trim()))
        .with_context(|| {
            let known: Vec<&str> = F::all().iter().map(|f| f.name()).collect();
            format!("Unknown member '{}'; expected one of {}", name, known.join(", "))
        })
}

fn resolve_fields<F: Field>(names: &[String]) -> Result<Vec<F>> {
    names.iter().map(|name| resolve_field(name)).collect()
}

/// Apply the command-line operators to a fresh collection
fn build_queryable<T: Resource>(args: &QueryArgs) -> Result<Queryable<T>> {
    let mut queryable = Queryable::<T>::new();

    for predicate in &args.filters {
        queryable = queryable.filter(parse_predicate::<T::Field>(predicate)?);
    }
    if !args.select.is_empty() {
        queryable = queryable.load(&resolve_fields::<T::Field>(&args.select)?);
    }
    if !args.expand.is_empty() {
        queryable = queryable.include(&resolve_fields::<T::Field>(&args.expand)?);
    }
    for key in &args.orderby {
        queryable = match key.rsplit_once(':') {
            Some((name, direction)) if direction.eq_ignore_ascii_case("desc") => {
                queryable.order_by_descending(resolve_field(name)?)
            }
            Some((name, direction)) if direction.eq_ignore_ascii_case("asc") => {
                queryable.order_by(resolve_field(name)?)
            }
            Some((_, direction)) => bail!("Unknown sort direction '{}' in '{}'", direction, key),
            None => queryable.order_by(resolve_field(key)?),
        };
    }
    if let Some(skip) = args.skip {
        queryable = queryable.skip(skip);
    }
    if let Some(top) = args.top {
        queryable = queryable.take(top);
    }
    Ok(queryable)
}

fn resource_path(args: &QueryArgs, transport: Transport) -> Result<Option<String>> {
    if let Some(path) = &args.path {
        return Ok(Some(path.clone()));
    }
    match (args.resource, &args.list) {
        (ResourceKind::Items, Some(list)) => Ok(Some(ListItem::items_of(list, transport))),
        (ResourceKind::Items, None) => bail!("--resource items needs --list <title> or --path"),
        (ResourceKind::Lists, _) => Ok(None),
    }
}

fn with_path<T: Resource>(queryable: Queryable<T>, path: Option<String>) -> Queryable<T> {
    match path {
        Some(path) => queryable.at(path),
        None => queryable,
    }
}

pub fn compose_command(args: QueryArgs, config: &Config) -> Result<()> {
    let transport = args.transport.unwrap_or(config.transport);
    let path = resource_path(&args, transport)?;

    let request = match args.resource {
        ResourceKind::Lists => {
            with_path(build_queryable::<List>(&args)?, path).to_request(transport)?
        }
        ResourceKind::Items => {
            with_path(build_queryable::<ListItem>(&args)?, path).to_request(transport)?
        }
    };

    println!("{}", request.query_string);
    if let Ok(base_url) = config.base_url(transport) {
        println!("{}", constants::api_url(&base_url, transport, &request.relative_url()).dimmed());
    }
    Ok(())
}

pub async fn run_command(args: QueryArgs, config: &Config) -> Result<()> {
    let transport = args.transport.unwrap_or(config.transport);
    let path = resource_path(&args, transport)?;
    let executor = HttpExecutor::from_config(config, transport)?;
    let ctx = ExecutionContext::new(executor, transport);

    info!("Running {:?} query on {}", args.resource, transport);
    let rows: Vec<Value> = match args.resource {
        ResourceKind::Lists => {
            let queryable = with_path(build_queryable::<List>(&args)?, path);
            let entities = queryable.to_list(&ctx).await?;
            entities.into_iter().map(|e| Value::Object(e.properties().clone())).collect()
        }
        ResourceKind::Items => {
            let queryable = with_path(build_queryable::<ListItem>(&args)?, path);
            let entities = queryable.to_list(&ctx).await?;
            entities.into_iter().map(|e| Value::Object(e.properties().clone())).collect()
        }
    };

    println!("{}", serde_json::to_string_pretty(&rows)?);
    eprintln!("{} {} rows", "✓".bright_green().bold(), rows.len());
    Ok(())
}
