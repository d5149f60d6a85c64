//! Controlled enumerated vocabularies used throughout the FOCUS cost
//! record and the plugin RPC surface.
//!
//! Every type here is a closed sum type with a stable string wire
//! form. Validation is a slice scan over a small `const` array of
//! variants (single digits to low tens), so it is O(1) in practice and
//! allocates nothing. Unknown values received on the wire are carried
//! in an `Unrecognized(String)` variant so round-tripping through this
//! process never drops data (forward compatibility, spec.md §4.1).

use std::fmt;

/// Declares a closed enum with a canonical wire-string for every named
/// variant, plus an `Unrecognized(String)` catch-all for forward
/// compatibility. Generates `as_str`, `FromStr`-style `parse`,
/// `all_variants`, and `is_valid`.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(#[default] $default_variant:ident => $default_str:literal,)?
            $($variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(into = "String", from = "String")]
        pub enum $name {
            $($default_variant,)?
            $($variant),*,
            /// A value observed on the wire that this build does not
            /// recognize. Carries the original string so it survives a
            /// decode → encode round trip unchanged.
            Unrecognized(String),
        }

        impl $name {
            /// All named (non-`Unrecognized`) variants, in declaration order.
            pub const fn all_variants() -> &'static [&'static str] {
                &[$($default_str,)? $($str),*]
            }

            /// `true` iff `s` names one of [`Self::all_variants`].
            pub fn is_valid(s: &str) -> bool {
                Self::all_variants().iter().any(|v| *v == s)
            }

            /// The canonical wire string for this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$default_variant => $default_str,)?
                    $(Self::$variant => $str,)*
                    Self::Unrecognized(s) => s.as_str(),
                }
            }

            /// Parse a wire string into this enum, falling back to
            /// [`Self::Unrecognized`] rather than failing — callers that
            /// need strict validation should check [`Self::is_valid`] first.
            pub fn parse(s: &str) -> Self {
                match s {
                    $($default_str => Self::$default_variant,)?
                    $($str => Self::$variant,)*
                    other => Self::Unrecognized(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> $name {
                $name::parse(&value)
            }
        }

        $(
            impl Default for $name {
                fn default() -> Self {
                    Self::$default_variant
                }
            }
        )?
    };
}

closed_enum! {
    /// FOCUS `ServiceCategory`.
    pub enum ServiceCategory {
        #[default] Unspecified => "unspecified",
        Compute => "compute",
        Storage => "storage",
        Network => "network",
        Database => "database",
        Analytics => "analytics",
        Ml => "ml",
        Management => "management",
        Security => "security",
        DevTools => "dev-tools",
        Other => "other",
    }
}

closed_enum! {
    /// FOCUS `ChargeCategory`.
    pub enum ChargeCategory {
        #[default] Unspecified => "unspecified",
        Usage => "usage",
        Purchase => "purchase",
        Credit => "credit",
        Tax => "tax",
        Refund => "refund",
        Adjustment => "adjustment",
    }
}

closed_enum! {
    /// FOCUS `ChargeClass`.
    pub enum ChargeClass {
        #[default] Unspecified => "unspecified",
        Correction => "correction",
        Standard => "standard",
    }
}

closed_enum! {
    /// FOCUS `ChargeFrequency`.
    pub enum ChargeFrequency {
        #[default] Unspecified => "unspecified",
        OneTime => "one-time",
        Recurring => "recurring",
        UsageBased => "usage-based",
    }
}

closed_enum! {
    /// FOCUS `PricingCategory`.
    pub enum PricingCategory {
        #[default] Unspecified => "unspecified",
        Standard => "standard",
        Committed => "committed",
        Dynamic => "dynamic",
        Other => "other",
    }
}

closed_enum! {
    /// FOCUS `CommitmentDiscountCategory`.
    pub enum CommitmentDiscountCategory {
        #[default] Unspecified => "unspecified",
        Spend => "spend",
        Usage => "usage",
    }
}

closed_enum! {
    /// FOCUS `CommitmentDiscountStatus`.
    pub enum CommitmentDiscountStatus {
        #[default] Unspecified => "unspecified",
        Used => "used",
        Unused => "unused",
    }
}

closed_enum! {
    /// FOCUS `CommitmentDiscountType`.
    pub enum CommitmentDiscountType {
        #[default] Unspecified => "unspecified",
        ReservedInstance => "reserved-instance",
        SavingsPlan => "savings-plan",
        CommittedUseDiscount => "committed-use-discount",
        Other => "other",
    }
}

closed_enum! {
    /// FOCUS `CapacityReservationStatus`.
    pub enum CapacityReservationStatus {
        #[default] Unspecified => "unspecified",
        Used => "used",
        Unused => "unused",
    }
}

closed_enum! {
    /// Plugin capability, spec.md §4.1 / §4.7.
    pub enum Capability {
        #[default] Unspecified => "unspecified",
        ActualCosts => "actual-costs",
        ProjectedCosts => "projected-costs",
        PricingSpec => "pricing-spec",
        EstimateCost => "estimate-cost",
        Recommendations => "recommendations",
        Budgets => "budgets",
        DismissRecommendations => "dismiss-recommendations",
        DryRun => "dry-run",
    }
}

closed_enum! {
    /// Recommendation category.
    pub enum RecommendationCategory {
        #[default] Unspecified => "unspecified",
        Cost => "cost",
        Performance => "performance",
        Security => "security",
        Reliability => "reliability",
        Anomaly => "anomaly",
    }
}

closed_enum! {
    /// Recommendation action type.
    pub enum RecommendationActionType {
        #[default] Unspecified => "unspecified",
        Rightsize => "rightsize",
        Terminate => "terminate",
        PurchaseCommitment => "purchase-commitment",
        AdjustRequests => "adjust-requests",
        Modify => "modify",
        DeleteUnused => "delete-unused",
        Investigate => "investigate",
        Other => "other",
    }
}

closed_enum! {
    /// Bypass severity, spec.md §3/§4.9.
    pub enum BypassSeverity {
        #[default] Unspecified => "unspecified",
        Warning => "warning",
        Error => "error",
        Critical => "critical",
    }
}

closed_enum! {
    /// Bypass mechanism, spec.md §3/§4.9.
    pub enum BypassMechanism {
        #[default] Unspecified => "unspecified",
        Flag => "flag",
        EnvVar => "env_var",
        Config => "config",
        Programmatic => "programmatic",
    }
}
