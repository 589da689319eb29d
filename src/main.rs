use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hr_recap::config::AppConfig;
use hr_recap::dashboard::{Dashboard, PublishTarget};
use hr_recap::export;
use hr_recap::io::excel_write;
use hr_recap::report::{HeadcountReport, ReportOptions, UnitFilter};
use hr_recap::vacancy::{VacancyOutcome, VacancyReport, VacancyScope};
use hr_recap::{Result, telemetry};
use serde::Serialize;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(&config.log_level)?;
    let mut dashboard = Dashboard::new(config);

    match cli.command {
        Command::Units => {
            for unit in dashboard.units()? {
                println!("{unit}");
            }
            Ok(())
        }
        Command::Report(args) => execute_report(&mut dashboard, args),
        Command::Vacancy(args) => execute_vacancy(&mut dashboard, args),
        Command::Publish(args) => {
            let receipt =
                dashboard.publish(&args.file, args.target.into(), args.message.as_deref())?;
            println!("published {} ({})", receipt.path, receipt.message);
            Ok(())
        }
        Command::LastUpdate => {
            println!("{}", dashboard.last_update().label());
            Ok(())
        }
    }
}

fn execute_report(dashboard: &mut Dashboard, args: ReportArgs) -> Result<()> {
    let unit = UnitFilter::from_selection(args.unit.as_deref());
    let options = ReportOptions {
        pin_permanent: !args.no_pin_permanent,
    };
    let report = dashboard.headcount(&unit, options)?;

    // The vacancy section is optional; a missing unit or workbook omits it.
    let vacancy = match &unit {
        UnitFilter::Unit(name) => {
            match dashboard.vacancy(&VacancyScope::new(Some(name.clone()), None)) {
                Ok(VacancyOutcome::Report(report)) => Some(report),
                Ok(VacancyOutcome::MissingSheets) => {
                    eprintln!("info: organisational workbook has no vacancy data");
                    None
                }
                Err(err) => {
                    eprintln!("info: vacancy section omitted: {err}");
                    None
                }
            }
        }
        UnitFilter::All => None,
    };

    if let Some(path) = &args.export {
        let workbook = export::build_report_workbook(&report, vacancy.as_ref());
        excel_write::write_workbook(path, &workbook)?;
    }

    if args.json {
        print_json(&ReportOutput {
            headcount: &report,
            vacancy: vacancy.as_ref(),
        })
    } else {
        print_headcount(&report);
        if let Some(vacancy) = &vacancy {
            print_vacancy(vacancy);
        }
        Ok(())
    }
}

fn execute_vacancy(dashboard: &mut Dashboard, args: VacancyArgs) -> Result<()> {
    let scope = VacancyScope::new(Some(args.unit), args.department);
    match dashboard.vacancy(&scope) {
        Ok(VacancyOutcome::Report(report)) if args.json => print_json(&report),
        Ok(VacancyOutcome::Report(report)) => {
            print_vacancy(&report);
            Ok(())
        }
        Ok(VacancyOutcome::MissingSheets) => {
            println!("Vacancy data is not available in the organisational workbook.");
            Ok(())
        }
        Err(err) => {
            println!("Vacancy data unavailable: {err}");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    headcount: &'a HeadcountReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    vacancy: Option<&'a VacancyReport>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_headcount(report: &HeadcountReport) {
    println!("Unit Kerja: {}", report.unit_label);
    println!("Total Karyawan: {}", report.total);
    println!();
    println!("Ringkasan Kategori");
    for row in &report.summary.rows {
        println!("  {:<40} {:>6}", row.label, row.count);
    }
    println!("  {:<40} {:>6}", "Total Tetap", report.summary.permanent_total);
    println!("  {:<40} {:>6}", "Total Tidak Tetap", report.summary.non_permanent_total);
    println!();
    println!("Semua Kategori");
    for category in &report.categories {
        println!("  {:<40} {:>6}", category.label(), category.count);
    }
    println!();
    println!(
        "Gender: Laki-laki {} | Perempuan {} | Lainnya {}",
        report.gender.male, report.gender.female, report.gender.other
    );
    println!("Disabilitas: {}", report.disability);
    println!();
    println!("Usia");
    for bucket in &report.age.buckets {
        println!("  {:<40} {:>6}", bucket.label, bucket.count);
    }
    println!();
    println!("Karyawan: {} baris", report.roster.len());
}

fn print_vacancy(report: &VacancyReport) {
    println!();
    println!(
        "Vacancy {}{}",
        report.unit.as_deref().unwrap_or("-"),
        report
            .department
            .as_deref()
            .map(|department| format!(" / {department}"))
            .unwrap_or_default()
    );
    println!(
        "Total {} | Terisi {} | Vacant {}",
        report.total, report.filled, report.vacant
    );
    for position in &report.positions {
        println!(
            "  {:<40} {:<20} {}",
            position.title.as_deref().unwrap_or(""),
            position.incumbent_name.as_deref().unwrap_or(""),
            position.status.label()
        );
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Headcount and vacancy recap over the HR employee database."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the distinct units of the employee database.
    Units,
    /// Headcount report for one unit or for every unit.
    Report(ReportArgs),
    /// Position status from the organisational structure workbook.
    Vacancy(VacancyArgs),
    /// Replace a workbook and publish it to the repository.
    Publish(PublishArgs),
    /// When the employee database last changed.
    LastUpdate,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Unit to report on; omitted or "Semua Unit" means every unit.
    #[arg(long)]
    unit: Option<String>,

    /// Keep the permanent categories in count order instead of on top.
    #[arg(long)]
    no_pin_permanent: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Also write the report to this .xlsx file.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(clap::Args)]
struct VacancyArgs {
    /// Unit whose positions are listed.
    #[arg(long)]
    unit: String,

    /// Department within the unit; "Semua Bagian" means all.
    #[arg(long)]
    department: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct PublishArgs {
    /// Replacement workbook.
    #[arg(long)]
    file: PathBuf,

    /// Which workbook the file replaces.
    #[arg(long, value_enum, default_value_t = TargetKind::Primary)]
    target: TargetKind,

    /// Commit message.
    #[arg(long)]
    message: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TargetKind {
    Primary,
    Org,
}

impl From<TargetKind> for PublishTarget {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Primary => PublishTarget::Primary,
            TargetKind::Org => PublishTarget::Org,
        }
    }
}
