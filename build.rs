// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: repository selection for text packages
fn package_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("path").help("Package directory (containing package.xml)"))
        .arg(
            Arg::new("repository")
                .long("repository")
                .value_name("DIR")
                .help("Repository directory holding the package"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .help("Package name inside the repository"),
        )
}

fn build_cli() -> Command {
    Command::new("ezpkg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Migrate content-class packages between archive and text form")
        .arg(Arg::new("config").long("config").value_name("PATH").help("Configuration file"))
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .help("Path to the repository database (default: /var/lib/ezpkg/ezpkg.db)"),
        )
        .arg(Arg::new("log_file").long("log-file").value_name("PATH").help("Diagnostic log file"))
        .arg(Arg::new("user_id").long("user-id").help("Act as this user when installing"))
        .arg(
            Arg::new("transformer")
                .long("transformer")
                .value_name("COMMAND")
                .help("Class-definition transformer command"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Also log to the console"),
        )
        .subcommand(Command::new("init").about("Create or upgrade the repository database"))
        .subcommand(
            Command::new("extract")
                .about("Extract binary packages matching a pattern and transform their classes")
                .arg(Arg::new("pattern").required(true).help("File pattern")),
        )
        .subcommand(
            package_args(Command::new("install").about("Install a text package")).arg(
                Arg::new("no_version_check")
                    .long("no-version-check")
                    .action(ArgAction::SetTrue)
                    .help("Replace classes even when the installed version is the same or newer"),
            ),
        )
        .subcommand(package_args(
            Command::new("uninstall").about("Uninstall a text package"),
        ))
        .subcommand(
            Command::new("install-binary")
                .about("Register and install a binary package")
                .arg(Arg::new("name").required(true).help("Name to register the package under"))
                .arg(Arg::new("file").required(true).help("Binary package file")),
        )
        .subcommand(
            Command::new("replace-binary")
                .about("Replace a registered package with a binary package")
                .arg(Arg::new("name").required(true).help("Registered package to replace"))
                .arg(Arg::new("file").required(true).help("Binary package file"))
                .arg(
                    Arg::new("new_name")
                        .long("new-name")
                        .help("Register the new package under this name"),
                ),
        )
        .subcommand(
            Command::new("remove-binary")
                .about("Remove a registered package")
                .arg(Arg::new("name").required(true).help("Registered package name")),
        )
        .subcommand(
            Command::new("change-class")
                .about("Move a content object to another class")
                .arg(Arg::new("object_id").required(true).help("Content object id"))
                .arg(
                    Arg::new("class_identifier")
                        .required(true)
                        .help("Identifier of the target class"),
                ),
        )
        .subcommand(Command::new("list").about("List registered packages"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("ezpkg.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
