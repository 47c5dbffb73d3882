use anyhow::{Context, bail};
use blueprint_script::store::DirectoryLoader;
use blueprint_script::{
    CacheObject, CacheStore, ExecuteWatcher, ExecutionContext, InMemoryStore, LogWatcher, Script,
    Session,
};
use std::sync::Arc;

const USAGE: &str =
    "usage: blueprint_script <script.json> [--data-dir DIR] [--store ID] [--input JSON] [--trace]";

struct Options {
    script: String,
    data_dir: String,
    store: String,
    input: serde_json::Value,
    trace: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut args = std::env::args().skip(1);
    let mut options = Options {
        script: String::new(),
        data_dir: "data".to_string(),
        store: "default".to_string(),
        input: serde_json::Value::Object(Default::default()),
        trace: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data-dir" => options.data_dir = args.next().context("--data-dir needs a value")?,
            "--store" => options.store = args.next().context("--store needs a value")?,
            "--input" => {
                let text = args.next().context("--input needs a value")?;
                options.input = serde_json::from_str(&text).context("--input is not valid JSON")?;
            }
            "--trace" => options.trace = true,
            "-h" | "--help" => bail!(USAGE),
            other if options.script.is_empty() => options.script = other.to_string(),
            other => bail!("unexpected argument {:?}\n{}", other, USAGE),
        }
    }

    if options.script.is_empty() {
        bail!(USAGE);
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let options = parse_args()?;

    let script = Script::from_path(&options.script)
        .with_context(|| format!("loading script {}", options.script))?;

    let store: Arc<CacheStore> = Arc::new(InMemoryStore::<CacheObject>::with_loader(
        options.store.clone(),
        DirectoryLoader::new(&options.data_dir),
    ));
    let session = Arc::new(Session::new().with_store(store));
    log::info!(
        "Running {} in session {} started {}",
        options.script,
        session.id(),
        session.started().format("%Y-%m-%d %H:%M:%S")
    );

    let mut ctx = match options.input.as_object() {
        Some(params) => ExecutionContext::with_params(session, params),
        None => ExecutionContext::new(session),
    };
    let watcher = LogWatcher;
    let watcher: Option<&dyn ExecuteWatcher> = if options.trace { Some(&watcher) } else { None };

    match script.execute(&options.input, &mut ctx, watcher) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Script failed: {}", e);
            bail!("[{}] {}", e.code(), e)
        }
    }
}
