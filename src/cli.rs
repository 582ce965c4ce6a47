use clap::{Args, Parser, Subcommand};
use std::{
    io::{stdin, stdout, IsTerminal, Read, Write},
    path::{Path, PathBuf},
};

use crate::{
    codes::{self, CodeTable},
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputOutputLocation {
    Path(PathBuf),
    Stdio,
}

impl InputOutputLocation {
    fn new(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdio
        } else {
            Self::Path(path)
        }
    }

    fn read_as_string(&self) -> std::io::Result<String> {
        match self {
            InputOutputLocation::Path(path) => crate::load_file(path),
            InputOutputLocation::Stdio => {
                let mut stdin = stdin();
                let mut buffer = String::new();
                stdin.read_to_string(&mut buffer)?;

                if buffer.starts_with('\u{feff}') {
                    // This is pretty inefficient but oh well
                    // U+FEFF is 3 bytes
                    buffer.drain(..3);
                }

                Ok(buffer)
            }
        }
    }

    fn save_table(&self, table: &Table) -> anyhow::Result<()> {
        match self {
            InputOutputLocation::Path(path) => table.save(path),
            InputOutputLocation::Stdio => {
                stdout().write_all(table.to_delimited()?.as_bytes())?;
                Ok(())
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Subcommands,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Builds the area code table from a scraped code dump
    Build(BuildArgs),
    /// Formats the phone number columns of a delimited table
    Format(FormatArgs),
    /// Reports formatted values that are not in canonical form
    Audit(AuditArgs),
}

impl Subcommands {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Subcommands::Build(args) => args.run(),
            Subcommands::Format(args) => args.run(),
            Subcommands::Audit(args) => args.run(),
        }
    }
}

#[derive(Args, Default, Debug)]
#[group(required = false, multiple = false)]
pub struct OutputArgs {
    /// Modify the table in-place without creating another file
    #[arg(long)]
    pub in_place: bool,
    /// Where to output the file.
    ///
    /// If an output file is not provided and it is not an in-place edit,
    /// then it defaults to creating a file in the current working directory
    /// with the same filename as the input file but with `_formatted`
    /// appended to the filename.
    ///
    /// If the output is being piped then it is printed into
    /// stdout instead.
    #[arg(short, long, verbatim_doc_comment)]
    pub output: Option<PathBuf>,
}

impl OutputArgs {
    fn resolve(self, input: &Path) -> anyhow::Result<InputOutputLocation> {
        if let Some(output) = self.output {
            Ok(InputOutputLocation::Path(output))
        } else if self.in_place {
            Ok(InputOutputLocation::Path(input.to_path_buf()))
        } else if !stdout().is_terminal() || input.as_os_str() == "-" {
            Ok(InputOutputLocation::Stdio)
        } else {
            let mut path = PathBuf::new();
            match input.file_stem() {
                Some(filename) => {
                    let mut filename = filename.to_os_string();
                    filename.push("_formatted");
                    if let Some(ext) = input.extension() {
                        filename.push(".");
                        filename.push(ext);
                    }
                    path.set_file_name(filename);
                    Ok(InputOutputLocation::Path(path))
                }
                None => anyhow::bail!("invalid filename given (no filename)"),
            }
        }
    }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// The scraped `area,code` dump to read.
    ///
    /// If `-` is given, then it's interpreted as stdin.
    file: PathBuf,
    /// Where to write the code table bundle.
    #[arg(short, long, default_value = "area_codes.json")]
    output: PathBuf,
}

impl BuildArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let input = InputOutputLocation::new(self.file);
        let contents = input.read_as_string()?;
        let table = CodeTable::from_raw_codes(codes::parse_code_dump(&contents));
        table.verify()?;
        table.save(&self.output)?;
        println!(
            "{} codes bucketed into {}",
            table.len(),
            self.output.display()
        );
        if !table.outliers.is_empty() {
            println!("{} entries could not be bucketed:", table.outliers.len());
            for outlier in &table.outliers {
                println!("  {outlier}");
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// The delimited table of phone numbers to format.
    ///
    /// If `-` is given, then it's interpreted as stdin.
    file: PathBuf,
    /// The code table bundle written by `build`.
    #[arg(short, long, default_value = "area_codes.json")]
    codes: PathBuf,
    /// The identifier column that is passed through untouched.
    #[arg(long, default_value = "Person ID")]
    id_column: String,
    #[command(flatten)]
    output: OutputArgs,
}

impl FormatArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let codes = CodeTable::load(&self.codes)?;
        let output = self.output.resolve(&self.file)?;
        let input = InputOutputLocation::new(self.file);
        let mut table = input.read_as_string()?.parse::<Table>()?;
        table.format_phone_columns(&codes, &self.id_column);
        output.save_table(&table)
    }
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// The formatted table to re-validate.
    ///
    /// If `-` is given, then it's interpreted as stdin.
    file: PathBuf,
}

impl AuditArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let input = InputOutputLocation::new(self.file);
        let table = input.read_as_string()?.parse::<Table>()?;
        let entries = table.audit();
        if entries.is_empty() {
            println!("all formatted values are canonical");
            return Ok(());
        }
        for entry in &entries {
            println!(
                "row {}: {} is not canonical: {:?} (from {:?})",
                entry.row + 1,
                entry.column,
                entry.formatted,
                entry.original
            );
        }
        println!("{} values failed the canonical shape", entries.len());
        Ok(())
    }
}
