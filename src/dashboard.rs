//! Orchestration of the loader, the reconcilers and the publish path for one
//! configured deployment.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::columns::{EMPLOYEE_FIELDS, Field, FieldMap};
use crate::config::{AppConfig, PublishStrategy};
use crate::error::{HrError, LoadError, PublishError, Result};
use crate::io::{self, DataSource, LastUpdate, SheetSelector, WorkbookLoader};
use crate::model::Workbook;
use crate::publish::{ContentsApiPublisher, GitPublisher, PublishReceipt, Publisher};
use crate::report::{EmployeeTable, HeadcountReport, ReportOptions, UnitFilter};
use crate::vacancy::{self, VacancyOutcome, VacancyScope};

/// Which workbook a replacement file overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    /// The employee database.
    Primary,
    /// The organisational structure workbook.
    Org,
}

/// Entry point for every report operation.
pub struct Dashboard {
    config: AppConfig,
    loader: WorkbookLoader,
}

impl Dashboard {
    pub fn new(config: AppConfig) -> Self {
        let loader = WorkbookLoader::new(config.fetch_timeout, config.cache_ttl);
        Self { config, loader }
    }

    pub fn with_loader(config: AppConfig, loader: WorkbookLoader) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn loader(&self) -> &WorkbookLoader {
        &self.loader
    }

    pub fn primary_source(&self) -> DataSource {
        DataSource::new(
            self.config.primary_local.clone(),
            Some(self.config.primary_url.clone()),
        )
    }

    pub fn org_source(&self) -> DataSource {
        DataSource::new(self.config.org_local.clone(), self.config.org_url.clone())
    }

    /// Loads the first sheet of the primary workbook. Any failure is fatal.
    pub fn employee_table(&mut self) -> Result<EmployeeTable> {
        let source = self.primary_source();
        let table = self.loader.load_sheet(&source, &SheetSelector::First)?;
        EmployeeTable::new(table)
    }

    pub fn units(&mut self) -> Result<Vec<String>> {
        Ok(self.employee_table()?.units())
    }

    #[instrument(level = "info", skip_all, fields(unit = %unit.display()))]
    pub fn headcount(&mut self, unit: &UnitFilter, options: ReportOptions) -> Result<HeadcountReport> {
        let employees = self.employee_table()?;
        let report = employees.report(unit, options);
        info!(total = report.total, "headcount computed");
        Ok(report)
    }

    /// Vacancy status for `scope`. Load failures of the organisational
    /// workbook are returned to the caller, which omits the section.
    #[instrument(level = "info", skip_all, fields(unit = ?scope.unit, department = ?scope.department))]
    pub fn vacancy(&mut self, scope: &VacancyScope) -> std::result::Result<VacancyOutcome, LoadError> {
        let workbook = self.org_workbook()?;
        let outcome = vacancy::report_from_workbook(&workbook, scope);
        if matches!(outcome, VacancyOutcome::MissingSheets) {
            info!("organisational workbook lacks the structure or vacancy sheet");
        }
        Ok(outcome)
    }

    fn org_workbook(&mut self) -> std::result::Result<Arc<Workbook>, LoadError> {
        let source = self.org_source();
        self.loader
            .load_all_sheets(&source)
            .inspect_err(|err| warn!(error = %err, "organisational workbook unavailable"))
    }

    pub fn last_update(&self) -> LastUpdate {
        self.loader.last_update(&self.primary_source())
    }

    /// Validates `file` and stores it as the new version of `target`. The
    /// cached copies of that target are dropped only when publishing succeeds.
    #[instrument(level = "info", skip_all, fields(file = %file.display(), target = ?target))]
    pub fn publish(
        &mut self,
        file: &Path,
        target: PublishTarget,
        message: Option<&str>,
    ) -> Result<PublishReceipt> {
        if !file.exists() {
            return Err(PublishError::MissingFile(file.to_path_buf()).into());
        }
        let content = fs::read(file)?;
        validate_replacement(&content, target)?;

        let (source, repo_path) = match target {
            PublishTarget::Primary => (self.primary_source(), &self.config.primary_local),
            PublishTarget::Org => (self.org_source(), &self.config.org_local),
        };
        let repo_path = repo_path.to_string_lossy().replace('\\', "/");
        let default_message = format!("Update {repo_path}");
        let message = message.unwrap_or(&default_message);

        let publisher = self.publisher()?;
        debug!(publisher = publisher.name(), path = %repo_path, "publishing workbook");
        let receipt = publisher.publish(&content, &repo_path, message)?;

        let dropped = self.loader.invalidate(&source);
        info!(dropped, "cache invalidated after publish");
        Ok(receipt)
    }

    fn publisher(&self) -> std::result::Result<Box<dyn Publisher>, PublishError> {
        match self.config.publish_strategy {
            PublishStrategy::Git => Ok(Box::new(GitPublisher::new(
                ".",
                self.config.identity.clone(),
            ))),
            PublishStrategy::ContentsApi => {
                let repository = self.config.repository.clone().ok_or_else(|| {
                    PublishError::Credentials("HR_REPO_OWNER and HR_REPO_NAME are required".into())
                })?;
                let token = self
                    .config
                    .token
                    .clone()
                    .ok_or_else(|| PublishError::Credentials("HR_GITHUB_TOKEN is required".into()))?;
                Ok(Box::new(ContentsApiPublisher::new(
                    repository,
                    token,
                    self.config.fetch_timeout,
                )))
            }
        }
    }
}

/// Parses the replacement and, for the employee database, checks that the
/// mandatory columns resolve.
pub fn validate_replacement(content: &[u8], target: PublishTarget) -> Result<()> {
    let invalid = |err: LoadError| HrError::from(PublishError::InvalidWorkbook(err.to_string()));
    match target {
        PublishTarget::Primary => {
            let table = io::excel_read::read_sheet(content, &SheetSelector::First).map_err(invalid)?;
            let fields = FieldMap::resolve(&table, &EMPLOYEE_FIELDS);
            for field in [Field::Unit, Field::EmployeeGroup] {
                fields.require(field).map_err(|err| {
                    HrError::from(PublishError::InvalidWorkbook(err.to_string()))
                })?;
            }
        }
        PublishTarget::Org => {
            io::excel_read::read_all_sheets(content).map_err(invalid)?;
        }
    }
    Ok(())
}
