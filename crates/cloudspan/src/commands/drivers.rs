use crate::output;
use cloudspan_driver::DriverRegistry;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct DriverEntry {
    provider: String,
    name: &'static str,
    version: String,
    capabilities: Vec<String>,
    missing: Vec<String>,
}

fn entries(registry: &DriverRegistry) -> anyhow::Result<Vec<DriverEntry>> {
    registry
        .providers()
        .into_iter()
        .map(|kind| -> anyhow::Result<DriverEntry> {
            let driver = registry.get(kind)?;
            let capability = driver.capability();
            Ok(DriverEntry {
                provider: kind.to_string(),
                name: kind.display_name(),
                version: driver.version().to_string(),
                capabilities: capability.iter().map(|c| c.to_string()).collect(),
                missing: capability.missing().iter().map(|c| c.to_string()).collect(),
            })
        })
        .collect()
}

pub fn handle(registry: &DriverRegistry, json: bool) -> anyhow::Result<()> {
    let entries = entries(registry)?;
    if json {
        return output::print_json(&entries);
    }

    if entries.is_empty() {
        println!("{}", "No drivers compiled in".dimmed());
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{} {} {}",
            format!("{:<10}", entry.provider).cyan().bold(),
            entry.name,
            format!("v{}", entry.version).dimmed()
        );
        println!("  {} {}", "supports:".green(), entry.capabilities.join(", "));
        if !entry.missing.is_empty() {
            println!("  {} {}", "missing: ".yellow(), entry.missing.join(", "));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_of_empty_registry() {
        assert!(entries(&DriverRegistry::new()).unwrap().is_empty());
    }

    #[cfg(feature = "rest")]
    #[test]
    fn test_entries_report_missing_capabilities() {
        let entries = entries(&crate::registry::build()).unwrap();
        let gcp = entries.iter().find(|e| e.provider == "gcp").unwrap();
        assert_eq!(gcp.missing, vec!["keypair", "publicip"]);
        assert_eq!(gcp.version, env!("CARGO_PKG_VERSION"));

        let openstack = entries.iter().find(|e| e.provider == "openstack").unwrap();
        assert!(openstack.missing.is_empty());
        assert_eq!(openstack.capabilities.len(), 7);
    }
}
