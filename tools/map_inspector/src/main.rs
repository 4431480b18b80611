use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::collections::BTreeMap;
use std::sync::Arc;

use spawn_engine::foundation::logging;
use spawn_engine::prelude::*;

/// Accepts every model name; the inspector only checks entity data
struct AnyModel;

impl ModelLoader for AnyModel {
    fn load(&self, name: &str) -> Option<Model> {
        (!name.is_empty()).then(|| Model::new(name))
    }
}

fn main() -> Result<()> {
    let matches = Command::new("map_inspector")
        .about("Spawns the entities of an entity lump and reports which ones fail")
        .arg(
            Arg::new("lump")
                .value_name("FILE")
                .help("Entity lump text file")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Scene configuration (.toml or .ron)"),
        )
        .arg(
            Arg::new("models")
                .short('m')
                .long("models")
                .value_name("FILE")
                .help("File listing available model names, one per line; all models resolve when omitted"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logging::try_init_with_level(level);

    let config = match matches.get_one::<String>("config") {
        Some(path) => SceneConfig::load_from_file(path).with_context(|| format!("loading {path}"))?,
        None => SceneConfig::default(),
    };

    let loader: Box<dyn ModelLoader> = match matches.get_one::<String>("models") {
        Some(path) => {
            let list = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            let catalog: ModelCatalog = list.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
            log::info!("{} models available", catalog.len());
            Box::new(catalog)
        }
        None => Box::new(AnyModel),
    };

    let lump_path = matches
        .get_one::<String>("lump")
        .context("no entity lump given")?;
    let lump = std::fs::read_to_string(lump_path).with_context(|| format!("reading {lump_path}"))?;

    let metadata = EntitySystemMetaDataBuilder::new().with_builtins()?.build()?;
    let mut scene = Scene::new(Arc::new(metadata), loader, config);

    let report = scene
        .load_entities(&lump)
        .with_context(|| format!("parsing {lump_path}"))?;

    let mut classes: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, entity) in scene.iter() {
        *classes.entry(entity.class_name()).or_default() += 1;
    }

    for (class_name, count) in &classes {
        println!("{count:>6}  {class_name}");
    }
    println!("{} spawned, {} failed", report.spawned, report.failed);

    Ok(())
}
