use anyhow::Result;
use clap::{Parser, Subcommand};
use grit::areas::repository::Repository;
use grit::artifacts::objects::object_type::ObjectType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "grit",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A minimal git storage engine",
    long_about = "A minimal implementation of git's storage model: loose objects, \
    the binary staging index, refs and tree build/diff/checkout. \
    A learning project, not a git replacement.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "init", about = "Initialize a new repository")]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(name = "cat-file", about = "Print the content of an object")]
    CatFile {
        #[arg(index = 1, help = "The object to print (id prefix, ref or HEAD)")]
        object: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file as a blob, optionally storing it"
    )]
    HashObject {
        #[arg(short, long, help = "Write the blob to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(index = 1, default_value = "HEAD", help = "The tree-ish to list")]
        tree: String,
    },
    #[command(name = "ls-files", about = "List the staged paths")]
    LsFiles,
    #[command(name = "show-ref", about = "List references and their ids")]
    ShowRef,
    #[command(name = "rev-parse", about = "Resolve a name to an object id")]
    RevParse {
        #[arg(index = 1, help = "The name to resolve")]
        name: String,
        #[arg(short = 't', long = "type", help = "Required object kind (blob, tree, commit, tag)")]
        kind: Option<String>,
    },
    #[command(name = "add", about = "Stage files or directories")]
    Add {
        #[arg(index = 1, required = true, help = "The paths to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(name = "rm", about = "Unstage files")]
    Rm {
        #[arg(index = 1, required = true, help = "The paths to unstage")]
        paths: Vec<PathBuf>,
        #[arg(long, help = "Also delete the files from the working directory")]
        delete: bool,
        #[arg(long, help = "Ignore paths that are not staged")]
        skip_missing: bool,
    },
    #[command(name = "commit", about = "Record the staged state as a commit")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "tag", about = "Create a tag, or list tags")]
    Tag {
        #[arg(index = 1, help = "The tag name; omit to list tags")]
        name: Option<String>,
        #[arg(index = 2, default_value = "HEAD", help = "The object to tag")]
        object: String,
        #[arg(short, long, help = "Create an annotated tag object")]
        annotate: bool,
        #[arg(short, long, help = "The annotation message")]
        message: Option<String>,
    },
    #[command(name = "switch", about = "Create a branch and switch HEAD to it")]
    Switch {
        #[arg(index = 1, help = "The branch to create")]
        branch: String,
    },
    #[command(name = "checkout", about = "Materialize a commit's tree into a directory")]
    Checkout {
        #[arg(index = 1, help = "The commit (or tree-ish) to check out")]
        object: String,
        #[arg(index = 2, help = "The target directory, created if missing")]
        target: PathBuf,
    },
}

fn locate() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::locate(&pwd, Box::new(std::io::stdout()))
}

/// Resolve user-supplied paths against the invoking directory, which may
/// be a subdirectory of the worktree.
fn absolutize(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let pwd = std::env::current_dir()?;
    Ok(paths
        .iter()
        .map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                pwd.join(path)
            }
        })
        .collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            grit::commands::porcelain::init::init(&path, Box::new(std::io::stdout()))?;
        }
        Commands::CatFile { object } => locate()?.cat_file(object)?,
        Commands::HashObject { write, file } => {
            let file = &absolutize(std::slice::from_ref(file))?[0];
            locate()?.hash_object(file, *write)?
        }
        Commands::LsTree { tree } => locate()?.ls_tree(tree)?,
        Commands::LsFiles => locate()?.ls_files()?,
        Commands::ShowRef => locate()?.show_ref()?,
        Commands::RevParse { name, kind } => {
            let expected = kind
                .as_deref()
                .map(ObjectType::try_from)
                .transpose()?;
            locate()?.rev_parse(name, expected)?;
        }
        Commands::Add { paths } => locate()?.add(&absolutize(paths)?)?,
        Commands::Rm {
            paths,
            delete,
            skip_missing,
        } => locate()?.rm(&absolutize(paths)?, *delete, *skip_missing)?,
        Commands::Commit { message } => {
            locate()?.commit(message)?;
        }
        Commands::Tag {
            name,
            object,
            annotate,
            message,
        } => {
            let repository = locate()?;
            match name {
                Some(name) => {
                    repository.tag(name, object, *annotate, message.as_deref())?
                }
                None => repository.tag_list()?,
            }
        }
        Commands::Switch { branch } => locate()?.switch_create(branch)?,
        Commands::Checkout { object, target } => locate()?.checkout(object, target)?,
    }

    Ok(())
}
