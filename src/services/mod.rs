pub mod allocator;
pub mod billing;
pub mod exporter;
pub mod jobs;
pub mod ledger;
pub mod notifier;
pub mod registry;
pub mod reports;
pub mod statistics;

pub use allocator::SpotAllocator;
pub use billing::BillingEngine;
pub use exporter::CsvExporter;
pub use jobs::JobService;
pub use ledger::ReservationLedger;
pub use notifier::Notifier;
pub use registry::LotRegistry;
pub use statistics::StatisticsAggregator;
