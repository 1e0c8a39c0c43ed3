//! CLI command handlers that bridge CLI arguments to library operations

use crate::cli_bin::args::{ListArgs, RunArgs, SearchOptions};
use coding_context::{
    Agent, Assembler, ContextConfig, Expression, Params, Result, SelectorMode, SelectorSet,
};
use log::{debug, info};

/// Execute the run command
pub fn run_command(args: RunArgs) -> Result<()> {
    debug!("Executing run command with args: {:?}", args);

    let mut config = search_config(&args.search)
        .with_params(Params::from_args(&args.params)?)
        .with_selectors(SelectorSet::from_args(&args.select, &args.exclude)?)
        .with_resume(args.resume)
        .with_agent(args.agent.as_deref().map(str::parse::<Agent>).transpose()?);
    if let Some(source) = &args.where_expr {
        config = config.with_mode(SelectorMode::Expression(Expression::parse(source)?));
    }
    for attachment in &args.attachments {
        config = config.with_attachment(attachment);
    }

    let assembly = Assembler::new(config).run(&args.task)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&assembly)?);
    } else {
        print!("{}", assembly.prompt);
        if !assembly.prompt.ends_with('\n') {
            println!();
        }
    }

    info!(
        "Task {}: {} rules, {} skills, ~{} tokens, {} warnings",
        assembly.task.path.display(),
        assembly.rules.len(),
        assembly.skills.len(),
        assembly.tokens,
        assembly.warnings.len()
    );
    Ok(())
}

/// Execute the list command
pub fn list_command(args: ListArgs) -> Result<()> {
    debug!("Executing list command with args: {:?}", args);

    let tasks = Assembler::new(search_config(&args.search)).list_tasks()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        info!("No tasks found");
        return Ok(());
    }
    let width = tasks.iter().map(|task| task.name.len()).max().unwrap_or(0);
    for task in &tasks {
        match &task.description {
            Some(description) => println!("{:width$}  {}", task.name, description),
            None => println!("{:width$}  {}", task.name, task.path.display()),
        }
    }
    Ok(())
}

fn search_config(search: &SearchOptions) -> ContextConfig {
    search
        .search_paths
        .iter()
        .fold(ContextConfig::new(&search.dir), |config, path| {
            config.with_search_path(path)
        })
}
