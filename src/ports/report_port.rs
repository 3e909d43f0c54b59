//! Report generation port trait.

use crate::domain::error::LabError;
use crate::domain::labeling::LabeledRun;
use crate::domain::metrics::LabelMetrics;
use crate::domain::labeling_config::LabelingConfig;

/// Port for writing the output of a labeling run.
pub trait ReportPort {
    fn write(
        &self,
        run: &LabeledRun,
        metrics: &LabelMetrics,
        config: &LabelingConfig,
        output_path: &str,
    ) -> Result<(), LabError>;
}
