//! Vendors command - manage vendors and their field schemas.

use chrono::Utc;
use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use rcpt_core::{FieldType, FieldUpdate, Vendor};

use super::remote::RemoteStore;

/// Arguments for the vendors command.
#[derive(Args)]
pub struct VendorsArgs {
    #[command(subcommand)]
    command: VendorsCommand,
}

#[derive(Subcommand)]
enum VendorsCommand {
    /// List vendors with their field counts
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create a vendor
    Add {
        /// Vendor name
        name: String,
    },

    /// Delete a vendor
    Remove {
        /// Vendor id or name
        vendor: String,

        /// Also delete the vendor and its receipts from the remote store
        #[arg(long)]
        remote: bool,
    },

    /// Show a vendor's fields
    Fields {
        /// Vendor id or name
        vendor: String,
    },

    /// Add a custom field to a vendor
    AddField {
        /// Vendor id or name
        vendor: String,

        /// Field name; the key is derived from it
        name: String,

        /// Display label (default: the name)
        #[arg(short, long)]
        label: Option<String>,

        /// Field type
        #[arg(short = 't', long = "type", default_value = "text", value_parser = parse_field_type)]
        field_type: FieldType,

        /// Value used when nothing is found on the receipt
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Edit a custom field
    UpdateField {
        /// Vendor id or name
        vendor: String,

        /// Field key
        key: String,

        /// New name; re-derives the key
        #[arg(short, long)]
        name: Option<String>,

        /// New display label
        #[arg(short, long)]
        label: Option<String>,

        /// New field type
        #[arg(short = 't', long = "type", value_parser = parse_field_type)]
        field_type: Option<FieldType>,

        /// New default value
        #[arg(short, long, conflicts_with = "clear_default")]
        default: Option<String>,

        /// Remove the default value
        #[arg(long)]
        clear_default: bool,
    },

    /// Delete a custom field
    RemoveField {
        /// Vendor id or name
        vendor: String,

        /// Field key
        key: String,
    },

    /// Enable or disable a custom field
    ToggleField {
        /// Vendor id or name
        vendor: String,

        /// Field key
        key: String,
    },

    /// Upload vendor definitions to the remote store
    Push {
        /// Vendor id or name (default: all vendors)
        vendor: Option<String>,
    },
}

fn parse_field_type(s: &str) -> Result<FieldType, String> {
    FieldType::from_name(s).ok_or_else(|| {
        let names: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown field type '{}', expected one of: {}", s, names.join(", "))
    })
}

pub async fn run(args: VendorsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let mut registry = super::open_vendors(&config)?;

    match args.command {
        VendorsCommand::List { json } => {
            let vendors = registry.vendors()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vendors)?);
            } else {
                print_vendor_table(&vendors);
            }
        }

        VendorsCommand::Add { name } => {
            let vendor = registry.create_vendor(&name, Utc::now())?;
            println!(
                "{} Created vendor '{}' ({})",
                style("✓").green(),
                vendor.name,
                vendor.id
            );
        }

        VendorsCommand::Remove { vendor, remote } => {
            let id = registry.find(&vendor)?.id;
            let removed = registry.delete_vendor(&id)?;
            println!(
                "{} Deleted vendor '{}' ({})",
                style("✓").green(),
                removed.name,
                removed.id
            );

            if remote {
                let remote = RemoteStore::from_config(&config.remote)?;
                remote.remove(&format!("vendors/{}", removed.id)).await?;
                remote.remove(&format!("vendor_data/{}", removed.id)).await?;
                info!("Removed remote data for vendor {}", removed.id);
            }
        }

        VendorsCommand::Fields { vendor } => {
            let vendor = registry.find(&vendor)?;
            print_fields(&vendor);
        }

        VendorsCommand::AddField {
            vendor,
            name,
            label,
            field_type,
            default,
        } => {
            let id = registry.find(&vendor)?.id;
            let label = label.unwrap_or_else(|| name.clone());
            let field = registry.add_field(&id, &name, &label, field_type, default)?;
            println!(
                "{} Added field '{}' ({}, {})",
                style("✓").green(),
                field.label,
                field.key,
                field.field_type
            );
        }

        VendorsCommand::UpdateField {
            vendor,
            key,
            name,
            label,
            field_type,
            default,
            clear_default,
        } => {
            let id = registry.find(&vendor)?.id;
            let default_value = if clear_default {
                Some(None)
            } else {
                default.map(Some)
            };
            let update = FieldUpdate {
                name,
                label,
                field_type,
                default_value,
            };
            registry.update_field(&id, &key, update)?;
            println!("{} Updated field '{}'", style("✓").green(), key);
        }

        VendorsCommand::RemoveField { vendor, key } => {
            let id = registry.find(&vendor)?.id;
            let field = registry.remove_field(&id, &key)?;
            println!("{} Removed field '{}'", style("✓").green(), field.key);
        }

        VendorsCommand::ToggleField { vendor, key } => {
            let id = registry.find(&vendor)?.id;
            let enabled = registry.toggle_field(&id, &key)?;
            let state = if enabled {
                style("enabled").green()
            } else {
                style("disabled").yellow()
            };
            println!("{} Field '{}' is now {}", style("✓").green(), key, state);
        }

        VendorsCommand::Push { vendor } => {
            let vendors = match vendor {
                Some(v) => vec![registry.find(&v)?],
                None => registry.vendors()?,
            };
            let remote = RemoteStore::from_config(&config.remote)?;
            for vendor in &vendors {
                remote.set(&format!("vendors/{}", vendor.id), vendor).await?;
            }
            println!(
                "{} Pushed {} vendor(s) to the remote store",
                style("✓").green(),
                vendors.len()
            );
        }
    }

    Ok(())
}

fn print_vendor_table(vendors: &[Vendor]) {
    println!(
        "{:<16} {:<24} {:>6} {:>6} {:>6}",
        "ID", "NAME", "FIELDS", "ACTIVE", "CUSTOM"
    );
    for vendor in vendors {
        let stats = vendor.stats();
        println!(
            "{:<16} {:<24} {:>6} {:>6} {:>6}",
            vendor.id, vendor.name, stats.total, stats.active, stats.custom
        );
    }
}

fn print_fields(vendor: &Vendor) {
    println!("{} ({})", style(&vendor.name).bold(), vendor.id);
    for field in &vendor.fields {
        let kind = if field.common { "common" } else { "custom" };
        let state = if field.enabled { "on" } else { "off" };
        let default = field
            .default_value
            .as_deref()
            .map(|d| format!(" [default: {}]", d))
            .unwrap_or_default();
        println!(
            "  {:<20} {:<20} {:<9} {:<7} {}{}",
            field.key,
            field.label,
            field.field_type.as_str(),
            kind,
            state,
            default
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_type() {
        assert_eq!(parse_field_type("Amount"), Ok(FieldType::Amount));
        assert_eq!(parse_field_type("yes/no"), Ok(FieldType::Boolean));
        let err = parse_field_type("money").unwrap_err();
        assert!(err.contains("text, number, amount, date, category, boolean"));
    }
}
