//! The six operational dashboard screens and their metric layouts.

use clap::ValueEnum;

use feed_adapter::presenter::{DashboardViewConfig, MetricColumn};

use crate::session::Role;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScreenKind {
    ImportJobs,
    ExportJobs,
    DeliveryOrders,
    Billing,
    Kyc,
    Documents,
}

impl ScreenKind {
    pub const ALL: [ScreenKind; 6] = [
        ScreenKind::ImportJobs,
        ScreenKind::ExportJobs,
        ScreenKind::DeliveryOrders,
        ScreenKind::Billing,
        ScreenKind::Kyc,
        ScreenKind::Documents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImportJobs => "import-jobs",
            Self::ExportJobs => "export-jobs",
            Self::DeliveryOrders => "delivery-orders",
            Self::Billing => "billing",
            Self::Kyc => "kyc",
            Self::Documents => "documents",
        }
    }

    /// Whether a role's navigation exposes this screen. Gating lives at
    /// the shell; the feed core never checks roles.
    pub fn permitted(&self, role: &Role) -> bool {
        match self {
            Self::Billing => matches!(role, Role::Admin | Role::Accounts),
            Self::Kyc => matches!(role, Role::Admin | Role::Compliance),
            _ => true,
        }
    }

    pub fn config(&self) -> DashboardViewConfig {
        match self {
            Self::ImportJobs => DashboardViewConfig::new(
                "Import jobs",
                vec![
                    MetricColumn::new("todayJobCreateImport", "Jobs opened today"),
                    MetricColumn::new("todayJobSubmissionImport", "Checklists submitted today"),
                    MetricColumn::new("pendingAssessmentImport", "Awaiting assessment"),
                    MetricColumn::new("queryRaisedImport", "Customs queries open"),
                    MetricColumn::new("outOfChargeToday", "Out of charge today"),
                ],
            ),
            Self::ExportJobs => DashboardViewConfig::new(
                "Export jobs",
                vec![
                    MetricColumn::new("todayJobCreateExport", "Jobs opened today"),
                    MetricColumn::new("todayJobSubmissionExport", "Checklists submitted today"),
                    MetricColumn::new("pendingLeoExport", "Awaiting let-export order"),
                    MetricColumn::new("shippingBillsFiledToday", "Shipping bills filed today"),
                ],
            ),
            Self::DeliveryOrders => DashboardViewConfig::new(
                "Delivery orders",
                vec![
                    MetricColumn::new("doPlanningPending", "DO planning pending"),
                    MetricColumn::new("doPlanningCompleted", "DO planning completed"),
                    MetricColumn::new("doIssuedToday", "DOs issued today"),
                    MetricColumn::new("doExpiringSoon", "DOs expiring soon"),
                ],
            ),
            Self::Billing => DashboardViewConfig::new(
                "Billing",
                vec![
                    MetricColumn::new("invoicesRaisedToday", "Invoices raised today"),
                    MetricColumn::new("invoicesUnpaid", "Invoices unpaid"),
                    MetricColumn::new("paymentsReceivedToday", "Payments received today"),
                    MetricColumn::new("creditNotesOpen", "Credit notes open"),
                ],
            ),
            Self::Kyc => DashboardViewConfig::new(
                "KYC",
                vec![
                    MetricColumn::new("kycPendingReview", "Pending review"),
                    MetricColumn::new("kycApprovedToday", "Approved today"),
                    MetricColumn::new("kycRejectedToday", "Rejected today"),
                    MetricColumn::new("kycExpiringSoon", "Expiring soon"),
                ],
            ),
            Self::Documents => DashboardViewConfig::new(
                "Documents",
                vec![
                    MetricColumn::new("docsSubmittedToday", "Submitted today"),
                    MetricColumn::new("docsAwaitingApproval", "Awaiting approval"),
                    MetricColumn::new("docsRejectedToday", "Rejected today"),
                    MetricColumn::new("docsReuploadRequested", "Re-upload requested"),
                ],
            ),
        }
    }
}
