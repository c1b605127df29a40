//! Command execution.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use pms_application::{ApiResult, TokenStore};
use pms_domain::{
    Credentials, DocumentGeneration, DownloadedFile, MultipartForm, Registration, ReportRequest,
    ServiceHealth, User,
};
use pms_infrastructure::{from_json, to_json_stable};
use serde_json::{Map, Value};

use crate::cli::{Command, ReportsCommand, TemplatesCommand};
use crate::console::Console;
use crate::prompt;

/// Runs `command`, printing results to stdout.
///
/// # Errors
///
/// Returns the first failure; API errors are kept as
/// `pms_application::ApiError` so the caller can present them.
pub async fn run(console: &Console, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = password_or_prompt(password).await?;
            let user = console
                .session
                .login(&Credentials::new(username, password))
                .await?;
            print_signed_in(&user);
        }
        Command::Register {
            username,
            email,
            password,
            user_type,
            first_name,
            last_name,
            phone,
        } => {
            let password = password_or_prompt(password).await?;
            let registration = Registration {
                first_name,
                last_name,
                phone_number: phone,
                ..Registration::new(username, email, password, user_type)
            };
            let user = console.session.register(&registration).await?;
            print_signed_in(&user);
        }
        Command::Logout => {
            console.session.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami => {
            let user = console.session.current_user().await?;
            print_json(&user)?;
        }
        Command::Status => print_status(console).await,
        Command::List { resource, query } => {
            let page: pms_domain::Page<Value> =
                console.resources.list(resource, &query.to_query()).await?;
            print_json(&page)?;
        }
        Command::Get { resource, id } => {
            let item: Value = console.resources.retrieve(resource, &id).await?;
            print_json(&item)?;
        }
        Command::Create { resource, data } => {
            let item: Value = console.resources.create(resource, &parse_data(&data)?).await?;
            print_json(&item)?;
        }
        Command::Update {
            resource,
            id,
            data,
            replace,
        } => {
            let body = parse_data(&data)?;
            let item: Value = if replace {
                console.resources.replace(resource, &id, &body).await?
            } else {
                console.resources.update(resource, &id, &body).await?
            };
            print_json(&item)?;
        }
        Command::Delete { resource, id } => {
            console.resources.destroy(resource, &id).await?;
            println!("Deleted {resource} {id}.");
        }
        Command::Action {
            resource,
            action,
            id,
            method,
            data,
        } => {
            let body = data.as_deref().map(parse_data).transpose()?;
            let result: Value = console
                .resources
                .action(method, resource, id.as_deref(), &action, body.as_ref())
                .await?;
            print_json(&result)?;
        }
        Command::Upload {
            resource,
            file,
            file_field,
            fields,
        } => {
            let form = upload_form(&file, &file_field, fields).await?;
            let item: Value = console.resources.upload(resource, form).await?;
            print_json(&item)?;
        }
        Command::Reports(command) => run_reports(console, command).await?,
        Command::Templates(command) => run_templates(console, command).await?,
    }
    Ok(())
}

async fn run_reports(console: &Console, command: ReportsCommand) -> anyhow::Result<()> {
    match command {
        ReportsCommand::Generate {
            report_type,
            start,
            end,
            property_ids,
            title,
        } => {
            anyhow::ensure!(start <= end, "--start must not be after --end");
            let request = ReportRequest {
                property_ids,
                title,
                ..ReportRequest::new(report_type, start, end)
            };
            print_json(&console.reports.generate(&request).await?)?;
        }
        ReportsCommand::List => print_json(&console.reports.list().await?)?,
        ReportsCommand::Templates => print_json(&console.reports.templates().await?)?,
        ReportsCommand::Delete { id } => {
            console.reports.delete(&id).await?;
            println!("Deleted report {id}.");
        }
    }
    Ok(())
}

async fn run_templates(console: &Console, command: TemplatesCommand) -> anyhow::Result<()> {
    let templates = &console.templates;
    match command {
        TemplatesCommand::List {
            category,
            template_type,
        } => print_json(
            &templates
                .list(category.as_deref(), template_type.as_deref())
                .await?,
        )?,
        TemplatesCommand::Show { id } => print_json(&templates.get(id).await?)?,
        TemplatesCommand::Variables { id } => print_json(&templates.variables(id).await?)?,
        TemplatesCommand::Generate {
            template_id,
            variables,
            title,
            related_model,
            related_id,
        } => {
            let mut generation = DocumentGeneration::new(template_id);
            if let Some(raw) = variables {
                generation.variables = parse_variables(&raw)?;
            }
            generation.title = title;
            if let (Some(model), Some(id)) = (related_model, related_id) {
                generation = generation.related_to(model, id);
            }
            print_json(&templates.generate(&generation).await?)?;
        }
        TemplatesCommand::Generated {
            status,
            template_type,
        } => print_json(
            &templates
                .generated(status.as_deref(), template_type.as_deref())
                .await?,
        )?,
        TemplatesCommand::Download { id, output } => {
            let file = templates.download(id).await?;
            let target = output.unwrap_or_else(|| download_target(&file, id));
            tokio::fs::write(&target, &file.bytes)
                .await
                .with_context(|| format!("could not write {}", target.display()))?;
            println!("Saved {} bytes to {}.", file.bytes.len(), target.display());
        }
        TemplatesCommand::Validate { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("could not read {}", file.display()))?;
            print_json(&templates.validate(&content).await?)?;
        }
    }
    Ok(())
}

async fn print_status(console: &Console) {
    let store = console.client.token_store();
    println!("API:      {}", console.settings.base_url);
    match &console.settings.token_file {
        Some(path) => println!("Session:  {}", path.display()),
        None => println!("Session:  in memory"),
    }
    match store.access_token() {
        Some(token) => {
            println!("Signed in: yes");
            if let Some(expires_at) = token.expires_at() {
                println!("Access token expires: {}", expires_at.to_rfc3339());
            }
        }
        None => println!("Signed in: no"),
    }
    println!(
        "Refresh state: {}",
        console.client.refresh_coordinator().state().label()
    );
    print_check("Server health", console.health.health().await);
    print_check("Server ready", console.health.ready().await);
}

fn print_check(label: &str, check: ApiResult<ServiceHealth>) {
    match check {
        Ok(report) => match report.error {
            Some(error) => println!("{label}: {} ({error})", report.status),
            None => println!("{label}: {}", report.status),
        },
        Err(error) => println!("{label}: unreachable ({error})"),
    }
}

fn print_signed_in(user: &User) {
    println!("Signed in as {user} ({})", user.user_type.display_name());
}

fn parse_data(raw: &str) -> anyhow::Result<Value> {
    let value: Value = from_json(raw).context("--data is not valid JSON")?;
    anyhow::ensure!(value.is_object(), "--data must be a JSON object");
    Ok(value)
}

async fn upload_form(
    file: &Path,
    file_field: &str,
    fields: Vec<(String, String)>,
) -> anyhow::Result<MultipartForm> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("could not read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

    let form = fields
        .into_iter()
        .fold(MultipartForm::new(), |form, (name, value)| form.text(name, value));
    Ok(form.file(file_field, file_name, bytes))
}

fn parse_variables(raw: &str) -> anyhow::Result<Map<String, Value>> {
    match from_json(raw).context("--vars is not valid JSON")? {
        Value::Object(variables) => Ok(variables),
        _ => anyhow::bail!("--vars must be a JSON object"),
    }
}

/// Server-suggested file name, reduced to its last component.
fn download_target(file: &DownloadedFile, id: u64) -> PathBuf {
    file.file_name
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .map_or_else(|| PathBuf::from(format!("document-{id}")), PathBuf::from)
}

async fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => tokio::task::spawn_blocking(|| prompt::read_password("Password: ")).await?,
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    print!("{}", to_json_stable(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pms_domain::request::PartContent;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn variables_must_be_an_object() {
        let variables = parse_variables(r#"{"tenant_name": "Ann", "rent": 1200}"#).unwrap();
        assert_eq!(variables.len(), 2);
        assert!(parse_variables(r#""Ann""#).is_err());
    }

    #[test]
    fn download_keeps_only_the_file_name() {
        let file = DownloadedFile {
            file_name: Some("../../etc/lease.pdf".to_string()),
            content_type: None,
            bytes: Vec::new(),
        };
        assert_eq!(download_target(&file, 9), PathBuf::from("lease.pdf"));

        let unnamed = DownloadedFile {
            file_name: None,
            ..file
        };
        assert_eq!(download_target(&unnamed, 9), PathBuf::from("document-9"));
    }

    #[test]
    fn data_must_be_an_object() {
        assert!(parse_data(r#"{"name": "Elm Court"}"#).is_ok());
        assert!(parse_data("[1, 2]").is_err());
        assert!(parse_data("{oops").is_err());
    }

    #[tokio::test]
    async fn upload_form_carries_file_and_fields() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("lease.pdf");
        std::fs::write(&file, b"%PDF-1.7").unwrap();

        let form = upload_form(&file, "file", vec![("title".to_string(), "Lease".to_string())])
            .await
            .unwrap();

        assert_eq!(form.parts.len(), 2);
        assert_eq!(form.parts[0].name, "title");
        assert_eq!(
            form.parts[1].content,
            PartContent::File {
                file_name: "lease.pdf".to_string(),
                bytes: b"%PDF-1.7".to_vec(),
            }
        );
    }
}
