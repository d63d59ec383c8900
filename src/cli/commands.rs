use crate::api::PayrollApi;
use crate::config::ClientConfig;
use crate::dashboard::Dashboard;
use crate::error::{NominaError, NominaResult};
use crate::stats::{Statistics, StatisticsView};
use crate::table::{EmployeeTable, SortColumn, SortDirection};
use crate::types::{PreviewSheetData, Sexo, ValidationResult};
use crate::workbook;
use crate::workflow::{Step, WorkflowController};
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins unless `verbose`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("nomina=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nomina=info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Defaults, then the YAML file if given, then the API URL override.
pub fn load_config(path: Option<&Path>, api_url: Option<String>) -> NominaResult<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_yaml_file(path)?,
        None => ClientConfig::default(),
    };
    Ok(match api_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => config.with_api_url(url),
        None => config,
    })
}

/// Format an amount with two decimals and thousands separators
fn format_money(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn stage_failed(stage: &'static str, message: Option<&str>) -> NominaError {
    NominaError::Stage {
        stage,
        message: message.unwrap_or("unknown error").to_string(),
    }
}

//==============================================================================
// inspect
//==============================================================================

/// Execute the inspect command (local only)
pub fn inspect(file: &Path) -> NominaResult<()> {
    println!("{}", "📂 Nomina - Workbook sheets".bold().green());
    println!("   File: {}\n", file.display());

    let sheets = workbook::inspect(file)?;
    if sheets.is_empty() {
        println!("{}", "⚠️  The workbook has no sheets".yellow());
        return Ok(());
    }

    for sheet in &sheets {
        println!(
            "   📄 {} ({} rows, {} columns)",
            sheet.name.bright_blue().bold(),
            sheet.rows,
            sheet.columns
        );
        if !sheet.headers.is_empty() {
            println!("      {}", sheet.headers.join(", ").dimmed());
        }
    }
    println!();
    println!(
        "{}",
        format!("✅ {} sheet(s) found", sheets.len()).bold().green()
    );
    Ok(())
}

//==============================================================================
// validate / preview / import
//==============================================================================

/// Accept and validate `file`. Local rejections never reach the API.
async fn submit(
    controller: &mut WorkflowController,
    api: &dyn PayrollApi,
    file: &Path,
) -> NominaResult<()> {
    if !controller.upload_mut().handle_path(file) {
        let message = controller.upload().error_message().unwrap_or_default();
        println!("{}", format!("❌ {}", message).bold().red());
        return Err(NominaError::LocalValidation(message.to_string()));
    }

    println!("{}", "🔍 Validating workbook...".cyan());
    controller.validate(api).await;
    match controller.validation() {
        Some(validation) => {
            print_validation(validation);
            Ok(())
        }
        None => {
            let message = controller.upload().error_message();
            println!("{}", format!("❌ {}", message.unwrap_or_default()).bold().red());
            Err(stage_failed("validate", message))
        }
    }
}

/// Narrow the default selection (all valid sheets) to `requested`.
fn select_sheets(controller: &mut WorkflowController, requested: &[String]) -> NominaResult<()> {
    if controller.step() != Step::Preview {
        return Err(stage_failed(
            "validate",
            Some("The workbook has no valid sheets to import"),
        ));
    }
    if requested.is_empty() {
        return Ok(());
    }

    if let Some(validation) = controller.validation() {
        if let Some(unknown) = requested.iter().find(|s| !validation.is_valid_sheet(s)) {
            return Err(NominaError::LocalValidation(format!(
                "Sheet '{}' is not a valid sheet (valid: {})",
                unknown,
                validation.valid_names().join(", ")
            )));
        }
    }

    let current = controller.selected_sheets().to_vec();
    for name in current.iter().filter(|name| !requested.contains(name)) {
        controller.toggle_sheet(name);
    }
    Ok(())
}

fn print_validation(validation: &ValidationResult) {
    println!();
    if validation.has_valid_sheets() {
        println!(
            "{}",
            format!("✅ Valid sheets ({}):", validation.valid_count).bold().green()
        );
        for sheet in &validation.valid_sheets {
            println!(
                "   📄 {} ({} rows)",
                sheet.name.bright_blue().bold(),
                sheet.rows
            );
            if !sheet.columns.is_empty() {
                println!("      {}", sheet.columns.join(", ").dimmed());
            }
        }
    }
    if !validation.invalid_sheets.is_empty() {
        println!(
            "{}",
            format!("❌ Invalid sheets ({}):", validation.invalid_count).bold().red()
        );
        for sheet in &validation.invalid_sheets {
            println!("   📄 {}", sheet.name.yellow());
            for error in &sheet.errors {
                println!("      - {}", error);
            }
        }
    }
    println!(
        "   Total: {} | Valid: {} | Invalid: {}",
        validation.total_sheets,
        validation.valid_count.to_string().green(),
        validation.invalid_count.to_string().red()
    );
    println!();
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_preview(preview: &PreviewSheetData, rows: usize) {
    println!(
        "   📊 {} ({} rows)",
        preview.sheet_name.bright_blue().bold(),
        preview.total_rows
    );
    if !preview.headers.is_empty() {
        println!("      {}", preview.headers.join(" | ").bold());
    }
    for row in preview.rows.iter().take(rows) {
        let cells: Vec<String> = match row {
            Value::Object(map) if !preview.headers.is_empty() => preview
                .headers
                .iter()
                .map(|h| map.get(h).map(cell_text).unwrap_or_default())
                .collect(),
            Value::Object(map) => map.values().map(cell_text).collect(),
            Value::Array(items) => items.iter().map(cell_text).collect(),
            other => vec![cell_text(other)],
        };
        println!("      {}", cells.join(" | "));
    }
    if preview.rows.len() > rows {
        println!(
            "      {}",
            format!("... {} more", preview.rows.len() - rows).dimmed()
        );
    }
}

/// Execute the validate command
pub async fn validate(api: &dyn PayrollApi, config: &ClientConfig, file: PathBuf) -> NominaResult<()> {
    println!("{}", "📋 Nomina - Validate workbook".bold().green());
    println!("   File: {}\n", file.display());

    let mut controller = WorkflowController::new(config.clone());
    submit(&mut controller, api, &file).await?;

    if controller.step() == Step::Preview {
        println!("{}", "✅ Ready to import".bold().green());
    } else {
        println!("{}", "⚠️  No sheet can be imported".yellow());
    }
    Ok(())
}

/// Execute the preview command
pub async fn preview(
    api: &dyn PayrollApi,
    config: &ClientConfig,
    file: PathBuf,
    sheets: Vec<String>,
    rows: usize,
) -> NominaResult<()> {
    println!("{}", "👀 Nomina - Preview sheets".bold().green());
    println!("   File: {}\n", file.display());

    let mut controller = WorkflowController::new(config.clone());
    submit(&mut controller, api, &file).await?;
    select_sheets(&mut controller, &sheets)?;

    if !controller.load_preview(api).await {
        let message = controller.preview().and_then(|p| p.import_error());
        return Err(stage_failed("preview", message));
    }
    if let Some(stage) = controller.preview() {
        for data in stage.preview_data() {
            print_preview(data, rows);
        }
    }
    println!();
    Ok(())
}

/// Execute the import command: the whole workflow, then the employee view
pub async fn import(
    api: &dyn PayrollApi,
    config: &ClientConfig,
    file: PathBuf,
    sheets: Vec<String>,
) -> NominaResult<()> {
    println!("{}", "📥 Nomina - Import workbook".bold().green());
    println!("   File: {}\n", file.display());

    let mut controller = WorkflowController::new(config.clone());
    let mut dashboard = Dashboard::new(config, controller.subscribe_reload());

    submit(&mut controller, api, &file).await?;
    select_sheets(&mut controller, &sheets)?;
    println!(
        "   Selected: {}",
        controller.selected_sheets().join(", ").bright_blue()
    );

    if !controller.load_preview(api).await {
        let message = controller.preview().and_then(|p| p.import_error());
        return Err(stage_failed("preview", message));
    }
    if let Some(stage) = controller.preview() {
        for data in stage.preview_data() {
            println!(
                "   📊 {}: {} rows",
                data.sheet_name.bright_blue(),
                data.total_rows
            );
        }
    }

    println!("{}", "⏳ Importing...".cyan());
    let Some(result) = controller.import(api).await else {
        let message = controller.preview().and_then(|p| p.import_error());
        println!("{}", format!("❌ {}", message.unwrap_or_default()).bold().red());
        return Err(stage_failed("import", message));
    };

    if let Some(message) = controller.preview().and_then(|p| p.import_message()) {
        println!("{}", format!("✅ {}", message).bold().green());
    }
    println!(
        "   Imported: {} | Errors: {} | Sheets: {}",
        result.imported_count.to_string().green(),
        result.error_count,
        result.sheets_processed.count()
    );
    println!();

    dashboard.refresh_if_signalled(api).await;
    match dashboard.table().error_message() {
        Some(message) => println!("{}", format!("⚠️  {}", message).yellow()),
        None => print_table(dashboard.table()),
    }
    match (dashboard.statistics().statistics(), dashboard.statistics().error_message()) {
        (Some(stats), _) => print_statistics(stats, crate::stats::DEFAULT_TOP_POSITIONS),
        (None, Some(message)) => println!("{}", format!("⚠️  {}", message).yellow()),
        (None, None) => {}
    }
    Ok(())
}

//==============================================================================
// employees / delete
//==============================================================================

/// Table options of the employees command.
#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    pub search: Option<String>,
    pub sexo: Option<Sexo>,
    pub cargo: Option<String>,
    pub sort: SortColumn,
    pub desc: bool,
    pub page: usize,
    pub export: Option<PathBuf>,
}

fn print_table(table: &EmployeeTable) {
    let Some((first, last)) = table.showing_range() else {
        println!("{}", "⚠️  No employees match".yellow());
        return;
    };
    println!(
        "{}",
        format!(
            "👥 Employees {}-{} of {} (total {})",
            first,
            last,
            table.filtered().len(),
            table.total_employees()
        )
        .bold()
        .green()
    );
    println!(
        "   {}",
        format!(
            "{:>5}  {:<24} {:>4}  {:<9}  {:<20} {:>12}",
            "ID", "Nombre", "Edad", "Sexo", "Cargo", "Sueldo"
        )
        .bold()
    );
    for e in table.paginated() {
        println!(
            "   {:>5}  {:<24} {:>4}  {:<9}  {:<20} {:>12}",
            e.id,
            truncate(&e.nombre, 24),
            e.edad,
            e.sexo.as_str(),
            truncate(&e.cargo, 20),
            format_money(e.sueldo)
        );
    }

    let pages: Vec<String> = table
        .page_numbers()
        .into_iter()
        .map(|n| {
            if n == table.current_page() {
                format!("[{}]", n).bold().to_string()
            } else {
                n.to_string()
            }
        })
        .collect();
    println!(
        "   Page {} of {}: {}",
        table.current_page(),
        table.total_pages(),
        pages.join(" ")
    );
    println!();
}

/// Execute the employees command
pub async fn employees(
    api: &dyn PayrollApi,
    config: &ClientConfig,
    query: EmployeeQuery,
) -> NominaResult<()> {
    let mut table = EmployeeTable::new(config);
    if !table.load(api).await {
        let message = table.error_message();
        println!("{}", format!("❌ {}", message.unwrap_or_default()).bold().red());
        return Err(stage_failed("employees", message));
    }

    if let Some(term) = query.search {
        table.set_search_term(term);
    }
    table.set_filter_sexo(query.sexo);
    table.set_filter_cargo(query.cargo);
    let direction = if query.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    table.set_sort(query.sort, direction);

    if query.page != 1 && !table.go_to_page(query.page) {
        return Err(NominaError::LocalValidation(format!(
            "Page {} is out of range (1-{})",
            query.page,
            table.total_pages()
        )));
    }

    print_table(&table);

    if let Some(path) = query.export {
        let written = table.export_csv_to(&path)?;
        println!(
            "{}",
            format!("✅ Exported {} employee(s) to {}", written, path.display())
                .bold()
                .green()
        );
    }
    Ok(())
}

/// Execute the delete command
pub async fn delete(api: &dyn PayrollApi, config: &ClientConfig, id: i64) -> NominaResult<()> {
    let mut table = EmployeeTable::new(config);
    table.delete_remote(api, id).await?;
    println!("{}", format!("✅ Employee {} deleted", id).bold().green());
    Ok(())
}

//==============================================================================
// stats / health
//==============================================================================

fn print_statistics(stats: &Statistics, top: usize) {
    println!("{}", "📈 Statistics".bold().green());
    println!(
        "   Employees: {} | Payroll: {} | Average salary: {} | Average age: {:.1}",
        stats.total_employees.to_string().bold(),
        format_money(stats.total_payroll),
        format_money(stats.average_salary),
        stats.average_age
    );
    println!(
        "   Salary range: {} - {}",
        format_money(stats.salary_range.min),
        format_money(stats.salary_range.max)
    );

    if !stats.by_sexo.is_empty() {
        println!("\n   {}", "By gender:".bold().cyan());
        for g in &stats.by_sexo {
            println!(
                "      {:<10} {:>5} employees, average {}",
                g.sexo,
                g.total_employees,
                format_money(g.average_salary)
            );
        }
    }

    let positions = stats.top_positions(top);
    if !positions.is_empty() {
        println!(
            "\n   {}",
            format!("Top {} positions:", positions.len()).bold().cyan()
        );
        for p in positions {
            println!(
                "      {:<24} {:>5} employees, average {}",
                truncate(&p.cargo, 24),
                p.total_employees,
                format_money(p.average_salary)
            );
        }
    }

    if !stats.age_distribution.is_empty() {
        println!("\n   {}", "By age:".bold().cyan());
        for (bucket, count) in &stats.age_distribution {
            println!("      {:<10} {:>5}", bucket, count);
        }
    }
    println!();
}

/// Execute the stats command
pub async fn stats(api: &dyn PayrollApi, top: usize) -> NominaResult<()> {
    let mut view = StatisticsView::new();
    if !view.load(api).await {
        let message = view.error_message();
        println!("{}", format!("❌ {}", message.unwrap_or_default()).bold().red());
        return Err(stage_failed("statistics", message));
    }
    if let Some(stats) = view.statistics() {
        print_statistics(stats, top);
    }
    Ok(())
}

/// Execute the health command
pub async fn health(api: &dyn PayrollApi) -> NominaResult<()> {
    let envelope = api.health().await?;
    if !envelope.is_status(&[200]) {
        return Err(envelope.failure("The API is not healthy"));
    }
    let detail = if envelope.message.trim().is_empty() {
        "ok".to_string()
    } else {
        envelope.message.clone()
    };
    println!("{}", format!("✅ API reachable: {}", detail).bold().green());
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
