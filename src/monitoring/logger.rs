use anyhow::Result;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;

use crate::engine::opportunity::Opportunity;

pub struct CsvLogger {
    log_path: String,
}

impl CsvLogger {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new().create(true).write(true).open(&log_path)?;

            writeln!(
                file,
                "timestamp,product,source_platform,source_price,target_platform,target_price,net_profit,roi_percentage,risk_level,category"
            )?;
        }

        Ok(Self { log_path })
    }

    /// Append one emitted opportunity to the CSV log.
    pub fn log_opportunity(&self, opportunity: &Opportunity) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.log_path)?;

        writeln!(
            file,
            "{},{},{},{:.2},{},{:.2},{:.2},{:.2},{:?},{}",
            opportunity.created_at.to_rfc3339(),
            escape(&opportunity.product_name),
            opportunity.source_platform,
            opportunity.source_price,
            opportunity.target_platform,
            opportunity.target_price,
            opportunity.net_profit,
            opportunity.roi_percentage,
            opportunity.risk_level,
            opportunity.category.as_deref().unwrap_or("")
        )?;

        Ok(())
    }

    /// Log a scan-level event row.
    pub fn log_event(&self, event: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.log_path)?;

        writeln!(file, "{},EVENT,{},,,,,,,", Utc::now().to_rfc3339(), escape(event))?;

        Ok(())
    }
}

// Commas in titles would shift columns.
fn escape(field: &str) -> String {
    field.replace(',', ";")
}
