//! Upgrade chain resolution
//!
//! Turns a (recorded, target) version pair into the ordered rules that bridge
//! it, then runs them against one document. The whole chain is resolved and
//! checked before the first rule runs, so a fatal error leaves the document
//! exactly as it was.

use asset_tree::Node;

use crate::catalog::UpgradeCatalog;
use crate::context::MigrationContext;
use crate::error::FatalMigrationError;
use crate::rule::UpgradeRule;
use crate::version::Version;

/// Ordered rules bridging two versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    recorded: Version,
    target: Version,
    steps: Vec<UpgradeRule>,
}

impl UpgradePlan {
    #[inline]
    #[must_use]
    pub fn recorded(&self) -> Version {
        self.recorded
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Version {
        self.target
    }

    /// Rules in application order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[UpgradeRule] {
        &self.steps
    }

    /// Rule names in application order
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(UpgradeRule::name).collect()
    }

    /// Recorded and target versions are equal
    #[inline]
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.recorded == self.target
    }
}

/// Result of a successful migration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Recorded version already equals the target; nothing ran
    UpToDate,
    /// Rules ran; the caller should stamp the target version
    Upgraded {
        applied: Vec<&'static str>,
        /// Entries reported as left unmigrated during this call
        diagnostics: usize,
    },
}

impl MigrationOutcome {
    #[inline]
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Self::UpToDate)
    }

    /// Diagnostics reported during this call
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> usize {
        match self {
            Self::UpToDate => 0,
            Self::Upgraded { diagnostics, .. } => *diagnostics,
        }
    }
}

/// Resolves and applies upgrade chains from a catalog
#[derive(Debug, Clone, Default)]
pub struct UpgradeChainResolver {
    catalog: UpgradeCatalog,
}

impl UpgradeChainResolver {
    #[inline]
    #[must_use]
    pub fn new(catalog: UpgradeCatalog) -> Self {
        Self { catalog }
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    /// Select and order the rules bridging `recorded` to `target`
    ///
    /// Selected rules are those whose `[from, to)` interval intersects the
    /// requested range, in ascending `from` order. A document recorded in
    /// the middle of a rule's interval still gets that rule. Equal versions
    /// yield an empty plan wherever they fall.
    ///
    /// # Errors
    /// - [`FatalMigrationError::Downgrade`] if `recorded > target`
    /// - [`FatalMigrationError::ChainGap`] if some sub-range has no rule
    /// - [`FatalMigrationError::TargetMisaligned`] if `target` falls strictly
    ///   inside a rule's interval
    pub fn resolve(&self, recorded: Version, target: Version) -> Result<UpgradePlan, FatalMigrationError> {
        if recorded > target {
            return Err(FatalMigrationError::Downgrade { recorded, target });
        }
        if recorded == target {
            return Ok(UpgradePlan {
                recorded,
                target,
                steps: Vec::new(),
            });
        }

        let mut steps = Vec::new();
        let mut cursor = recorded;
        for rule in self
            .catalog
            .rules()
            .iter()
            .filter(|rule| rule.from() < target && rule.to() > recorded)
        {
            if rule.from() > cursor {
                return Err(FatalMigrationError::ChainGap {
                    from: cursor,
                    to: rule.from(),
                });
            }
            if rule.to() > target {
                return Err(FatalMigrationError::TargetMisaligned {
                    target,
                    rule: rule.name(),
                    from: rule.from(),
                    to: rule.to(),
                });
            }
            steps.push(*rule);
            cursor = rule.to();
        }

        if cursor < target {
            return Err(FatalMigrationError::ChainGap {
                from: cursor,
                to: target,
            });
        }

        Ok(UpgradePlan {
            recorded,
            target,
            steps,
        })
    }

    /// Migrate `root` in place from the context's recorded version to its
    /// target version
    ///
    /// Stamping the document with the new version is left to the caller.
    ///
    /// # Errors
    /// Returns [`FatalMigrationError`] if the chain cannot be resolved; the
    /// document is then untouched
    pub fn migrate(&self, root: &mut Node, ctx: &MigrationContext) -> Result<MigrationOutcome, FatalMigrationError> {
        let plan = self
            .resolve(ctx.recorded_version(), ctx.target_version())
            .map_err(|e| {
                tracing::error!(asset = ctx.asset(), "upgrade chain rejected: {}", e);
                e
            })?;

        if plan.is_up_to_date() {
            tracing::debug!(asset = ctx.asset(), version = %plan.target(), "asset up to date");
            return Ok(MigrationOutcome::UpToDate);
        }

        tracing::info!(
            asset = ctx.asset(),
            from = %plan.recorded(),
            to = %plan.target(),
            "upgrading asset through {} rules",
            plan.steps().len()
        );

        let reported_before = ctx.diagnostic_count();
        for rule in plan.steps() {
            tracing::debug!(asset = ctx.asset(), rule = rule.name(), "applying upgrade rule");
            rule.apply(root, ctx);
        }
        let diagnostics = ctx.diagnostic_count() - reported_before;

        if diagnostics > 0 {
            tracing::warn!(
                asset = ctx.asset(),
                "asset upgraded with {} entries left unmigrated",
                diagnostics
            );
        } else {
            tracing::info!(asset = ctx.asset(), "asset upgraded");
        }

        Ok(MigrationOutcome::Upgraded {
            applied: plan.rule_names(),
            diagnostics,
        })
    }
}

/// Migrate with the built-in entity hierarchy catalog
///
/// # Errors
/// See [`UpgradeChainResolver::migrate`]
pub fn migrate(root: &mut Node, ctx: &MigrationContext) -> Result<MigrationOutcome, FatalMigrationError> {
    UpgradeChainResolver::default().migrate(root, ctx)
}
