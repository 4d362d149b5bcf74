use finapp_core::{AccountId, Scope};
use sqlx::{QueryBuilder, Sqlite};

/// Row-level restriction by account and sector, applied to transaction
/// queries aliased as `t`. Inert unless enforcement is switched on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    enforced: bool,
    scope: Scope,
}

impl ScopeFilter {
    pub fn new(enforced: bool, scope: Scope) -> Self {
        ScopeFilter { enforced, scope }
    }

    pub fn inert() -> Self {
        ScopeFilter::default()
    }

    pub fn is_active(&self) -> bool {
        self.enforced && !self.scope.is_unrestricted()
    }

    /// Whether a row booked to `account` in `sector` is visible. Mirrors
    /// [`ScopeFilter::push_conditions`].
    pub fn allows(&self, account: Option<AccountId>, sector: Option<&str>) -> bool {
        if !self.enforced {
            return true;
        }
        if self.scope.account_id.is_some() && account != self.scope.account_id {
            return false;
        }
        self.scope.sectors.is_empty()
            || sector.is_some_and(|s| self.scope.sectors.iter().any(|allowed| allowed == s))
    }

    /// Whether the account itself is visible; sectors do not apply.
    pub fn allows_account(&self, account: AccountId) -> bool {
        !self.enforced || self.scope.account_id.map_or(true, |own| own == account)
    }

    /// Appends `AND ...` conditions. The builder must already contain a
    /// `WHERE` clause.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if !self.enforced {
            return;
        }
        if let Some(account) = self.scope.account_id {
            qb.push(" AND t.account_id = ").push_bind(account.0);
        }
        if !self.scope.sectors.is_empty() {
            qb.push(" AND t.sector IN (");
            let mut list = qb.separated(", ");
            for sector in &self.scope.sectors {
                list.push_bind(sector.clone());
            }
            list.push_unseparated(")");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finapp_core::AccountId;

    fn scoped() -> Scope {
        Scope {
            account_id: Some(AccountId(3)),
            sectors: vec!["Comercial".into(), "Logística".into()],
        }
    }

    #[test]
    fn inert_filter_adds_nothing() {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT 1 FROM transactions t WHERE 1=1");
        ScopeFilter::new(false, scoped()).push_conditions(&mut qb);
        assert_eq!(qb.sql(), "SELECT 1 FROM transactions t WHERE 1=1");
    }

    #[test]
    fn enforced_filter_restricts_account_and_sectors() {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT 1 FROM transactions t WHERE 1=1");
        let filter = ScopeFilter::new(true, scoped());
        assert!(filter.is_active());
        filter.push_conditions(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM transactions t WHERE 1=1 AND t.account_id = ? AND t.sector IN (?, ?)"
        );
    }

    #[test]
    fn row_checks_follow_the_query_conditions() {
        let filter = ScopeFilter::new(true, scoped());
        assert!(filter.allows(Some(AccountId(3)), Some("Comercial")));
        assert!(!filter.allows(Some(AccountId(1)), Some("Comercial")));
        assert!(!filter.allows(Some(AccountId(3)), Some("Produção")));
        assert!(!filter.allows(Some(AccountId(3)), None));
        assert!(filter.allows_account(AccountId(3)));
        assert!(!filter.allows_account(AccountId(1)));

        let inert = ScopeFilter::new(false, scoped());
        assert!(inert.allows(None, None));
        assert!(inert.allows_account(AccountId(1)));
    }
}
