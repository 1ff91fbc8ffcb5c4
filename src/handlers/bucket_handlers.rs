//! Handlers for bucket management commands. Thin pass-throughs to
//! `BucketAdmin`; validation and rendering only.

use crate::cli::{BucketCommand, EncryptionCommand, LifecycleCommand, PolicyCommand, PolicyKindArg};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::admin::{BucketAdmin, PolicyKind, website_url};

pub async fn dispatch(
    admin: &BucketAdmin,
    config: &AppConfig,
    command: BucketCommand,
) -> Result<(), AppError> {
    match command {
        BucketCommand::List => list(admin).await,
        BucketCommand::Create {
            name,
            region,
            no_exists_check,
        } => create(admin, &name, &region, no_exists_check).await,
        BucketCommand::Delete { name } => {
            admin.delete_bucket(&name).await?;
            println!("Bucket {name} deleted");
            Ok(())
        }
        BucketCommand::Exists { name } => {
            println!("{}", admin.bucket_exists(&name).await?);
            Ok(())
        }
        BucketCommand::Versioning { name } => {
            match admin.versioning_status(&name).await? {
                Some(status) => println!("Versioning status for {name}: {}", status.as_str()),
                None => println!("Versioning status for {name}: not enabled"),
            }
            Ok(())
        }
        BucketCommand::Policy(command) => policy(admin, command).await,
        BucketCommand::Lifecycle(command) => lifecycle(admin, command).await,
        BucketCommand::Encryption(command) => encryption(admin, command).await,
        BucketCommand::Website {
            name,
            index,
            error_doc,
        } => {
            admin.configure_website(&name, &index, &error_doc).await?;
            let region = config.region.as_deref().unwrap_or("us-east-1");
            println!("Website hosting enabled for {name}");
            println!("{}", website_url(&name, region));
            Ok(())
        }
    }
}

async fn list(admin: &BucketAdmin) -> Result<(), AppError> {
    let buckets = admin.list_buckets().await?;
    if buckets.is_empty() {
        println!("No buckets found");
        return Ok(());
    }
    for bucket in buckets {
        match bucket.created_at {
            Some(created) => println!("  {}  (created {})", bucket.name, created.date_naive()),
            None => println!("  {}", bucket.name),
        }
    }
    Ok(())
}

async fn create(
    admin: &BucketAdmin,
    name: &str,
    region: &str,
    no_exists_check: bool,
) -> Result<(), AppError> {
    if !no_exists_check && admin.bucket_exists(name).await? {
        return Err(AppError::failure(format!("bucket {name} already exists")));
    }
    admin.create_bucket(name, region).await?;
    println!("Bucket {name} created in {region}");
    Ok(())
}

async fn policy(admin: &BucketAdmin, command: PolicyCommand) -> Result<(), AppError> {
    match command {
        PolicyCommand::Read { name } => {
            match admin.read_policy(&name).await? {
                Some(document) => {
                    // Pretty-print when the store hands back valid JSON.
                    match serde_json::from_str::<serde_json::Value>(&document) {
                        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                        Err(_) => println!("{document}"),
                    }
                }
                None => println!("Bucket {name} has no policy"),
            }
            Ok(())
        }
        PolicyCommand::Assign { name, kind } => {
            let kind = match kind {
                PolicyKindArg::PublicRead => PolicyKind::PublicRead,
                PolicyKindArg::FullAccess => PolicyKind::FullAccess,
            };
            admin.assign_policy(&name, kind).await?;
            println!("Policy assigned to {name}");
            Ok(())
        }
    }
}

async fn lifecycle(admin: &BucketAdmin, command: LifecycleCommand) -> Result<(), AppError> {
    match command {
        LifecycleCommand::Set { name, days } => {
            admin.set_lifecycle_expiration(&name, days).await?;
            println!("Objects in {name} now expire after {days} days");
            Ok(())
        }
        LifecycleCommand::Get { name } => {
            let rules = admin.lifecycle_rules(&name).await?;
            if rules.is_empty() {
                println!("Bucket {name} has no lifecycle rules");
                return Ok(());
            }
            for rule in rules {
                let id = rule.id.as_deref().unwrap_or("<unnamed>");
                match rule.expiration_days {
                    Some(days) => println!("  {id}: expire after {days} days ({})", rule.status),
                    None => println!("  {id}: no expiration ({})", rule.status),
                }
            }
            Ok(())
        }
    }
}

async fn encryption(admin: &BucketAdmin, command: EncryptionCommand) -> Result<(), AppError> {
    match command {
        EncryptionCommand::Set { name } => {
            admin.set_encryption(&name).await?;
            println!("AES-256 default encryption enabled for {name}");
            Ok(())
        }
        EncryptionCommand::Get { name } => {
            let algorithms = admin.encryption_algorithms(&name).await?;
            if algorithms.is_empty() {
                println!("Bucket {name} has no default encryption");
            } else {
                println!("Default encryption for {name}: {}", algorithms.join(", "));
            }
            Ok(())
        }
    }
}
