//! Entrypoint for CLI
mod conf;

use std::{
    env, fmt, fs, io,
    path::{Path, PathBuf},
    process,
    time::Instant,
};

use jackc::{prelude::*, IMPL_VERSION};
use log::{error, info, warn, LevelFilter};

use conf::CliConf;

static USAGE: &str = r#"
usage: jackc [--config FILE] CMD PATH

commands:
    compile   Compile a .jack file, or every .jack file under a directory
    tokens    Print the tokens of a .jack file as XML
    tree      Print the parse tree of a .jack file as XML

options:
    --config  YAML configuration file, defaults to ./jackc.yaml if present

examples:
    jackc compile Square/
    jackc compile Main.jack
    jackc tokens Main.jack
    jackc --config release.yaml tree Main.jack
"#;

fn run_compile(path: &Path, conf: &CliConf) -> Result<(), CliError> {
    let sources = collect_sources(path)?;
    info!("compiling {} file(s)", sources.len());

    for source_path in &sources {
        compile_file(source_path, conf)?;
    }

    Ok(())
}

/// A single file, or the `.jack` files anywhere under a directory
/// sorted by path.
fn collect_sources(path: &Path) -> Result<Vec<PathBuf>, CliError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = vec![];
    walk_sources(path, &mut sources)?;

    if sources.is_empty() {
        return Err(CliError::NoSources(path.to_path_buf()));
    }

    sources.sort();
    Ok(sources)
}

fn walk_sources(dir: &Path, sources: &mut Vec<PathBuf>) -> Result<(), CliError> {
    let entries = fs::read_dir(dir).map_err(|err| CliError::Read(dir.to_path_buf(), err))?;
    for entry in entries {
        let entry_path = entry
            .map_err(|err| CliError::Read(dir.to_path_buf(), err))?
            .path();
        if entry_path.is_dir() {
            walk_sources(&entry_path, sources)?;
        } else if entry_path.extension().map_or(false, |ext| ext == "jack") {
            sources.push(entry_path);
        }
    }
    Ok(())
}

fn compile_file(path: &Path, conf: &CliConf) -> Result<(), CliError> {
    let source = read_source(path)?;

    let start = Instant::now();
    let output = compile_class(&source, &conf.compiler).map_err(|err| CliError::compile(path, &source, err))?;
    let elapsed = start.elapsed();

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| output.class_name.to_string());
    if stem != output.class_name.as_str() {
        warn!("{} declares class {}", path.display(), output.class_name);
    }

    let out_dir = match &conf.output_dir {
        Some(dir) => dir.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let vm_path = out_dir.join(format!("{stem}.vm"));
    write_output(&vm_path, &output.vm)?;

    if let Some(xml) = &output.xml {
        write_output(&out_dir.join(format!("{stem}.xml")), xml)?;
    }

    info!(
        "{} -> {} in {}ms",
        path.display(),
        vm_path.display(),
        elapsed.as_nanos() as f64 / 1000000.0
    );

    Ok(())
}

fn run_tokens(path: &Path) -> Result<(), CliError> {
    let source = read_source(path)?;

    let xml = tokens_xml(&source).map_err(|err| CliError::compile(path, &source, err))?;
    print!("{xml}");

    Ok(())
}

fn run_tree(path: &Path) -> Result<(), CliError> {
    let source = read_source(path)?;

    let conf = CompilerConf { emit_tree: true };
    let output = compile_class(&source, &conf).map_err(|err| CliError::compile(path, &source, err))?;
    if let Some(xml) = output.xml {
        print!("{xml}");
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|err| CliError::Read(path.to_path_buf(), err))
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|err| CliError::Write(path.to_path_buf(), err))
}

fn main() {
    let args = match parse_args(env::args().skip(1)) {
        Some(args) => args,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    let conf = match CliConf::load(args.config.as_deref()) {
        Ok(conf) => conf,
        Err(err) => {
            eprintln!("{err}");
            // FreeBSD EX_CONFIG (78)
            process::exit(78)
        }
    };

    let level = conf.level_filter().ok().flatten().unwrap_or(LevelFilter::Info);
    if let Err(err) = simple_logger::SimpleLogger::new().with_level(level).env().init() {
        eprintln!("failed to initialise logger: {err}");
    }

    let result = match &args.cmd {
        Cmd::Compile { path } => run_compile(path, &conf),
        Cmd::Tokens { path } => run_tokens(path),
        Cmd::Tree { path } => run_tree(path),
    };

    if let Err(err) = result {
        error!("{err}");
        process::exit(1)
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut config = None;
    let mut cmd = args.next()?;

    if cmd == "--config" {
        config = Some(PathBuf::from(args.next()?));
        cmd = args.next()?;
    }

    let path = PathBuf::from(args.next()?);
    if args.next().is_some() {
        return None;
    }

    let cmd = match cmd.as_str() {
        "compile" => Cmd::Compile { path },
        "tokens" => Cmd::Tokens { path },
        "tree" => Cmd::Tree { path },
        _ => return None,
    };

    Some(Args { config, cmd })
}

fn print_usage() {
    println!("jackc v{IMPL_VERSION}");
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    cmd: Cmd,
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    /// Compile a file or directory
    Compile { path: PathBuf },
    /// Dump tokens
    Tokens { path: PathBuf },
    /// Dump parse tree
    Tree { path: PathBuf },
}

#[derive(Debug)]
enum CliError {
    Read(PathBuf, io::Error),
    Write(PathBuf, io::Error),
    NoSources(PathBuf),
    /// Compilation failed, with the error already rendered
    /// against the source.
    Compile { path: PathBuf, message: String },
}

impl CliError {
    fn compile(path: &Path, source: &str, err: JackError) -> Self {
        CliError::Compile {
            path: path.to_path_buf(),
            message: err.render(source),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Read(path, err) => write!(f, "failed to read {}: {err}", path.display()),
            Self::Write(path, err) => write!(f, "failed to write {}: {err}", path.display()),
            Self::NoSources(path) => write!(f, "no .jack files in {}", path.display()),
            Self::Compile { path, message } => write!(f, "{}\n{message}", path.display()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(line: &str) -> Option<Args> {
        parse_args(line.split_whitespace().map(String::from))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            args("compile Square"),
            Some(Args {
                config: None,
                cmd: Cmd::Compile {
                    path: PathBuf::from("Square")
                },
            })
        );
        assert_eq!(
            args("--config jackc.yaml tree Main.jack"),
            Some(Args {
                config: Some(PathBuf::from("jackc.yaml")),
                cmd: Cmd::Tree {
                    path: PathBuf::from("Main.jack")
                },
            })
        );
        assert!(matches!(args("tokens Main.jack"), Some(Args { cmd: Cmd::Tokens { .. }, .. })));
    }

    #[test]
    fn test_parse_bad_usage() {
        assert_eq!(args(""), None);
        assert_eq!(args("compile"), None);
        assert_eq!(args("run Main.jack"), None);
        assert_eq!(args("compile a.jack b.jack"), None);
        assert_eq!(args("--config"), None);
    }

    #[test]
    fn test_collect_sources_recursive() {
        let root = env::temp_dir().join(format!("jackc-sources-{}", process::id()));
        let nested = root.join("lib").join("util");
        fs::create_dir_all(&nested).unwrap();
        for file in ["Main.jack", "notes.txt", "lib/Point.jack", "lib/util/Math.jack"] {
            fs::write(root.join(file), "class X { }").unwrap();
        }

        let sources = collect_sources(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        assert_eq!(
            sources,
            vec![
                root.join("Main.jack"),
                root.join("lib/Point.jack"),
                root.join("lib/util/Math.jack"),
            ]
        );
    }

    #[test]
    fn test_collect_sources_empty_dir() {
        let root = env::temp_dir().join(format!("jackc-empty-{}", process::id()));
        fs::create_dir_all(root.join("nested")).unwrap();

        let result = collect_sources(&root);
        fs::remove_dir_all(&root).unwrap();

        assert!(matches!(result, Err(CliError::NoSources(_))));
    }
}
