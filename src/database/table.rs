/// How a row leaves normal reads when it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// `deleted_at` is set; the row stays for audit.
    Soft,
    /// The row is removed.
    Hard,
}

/// Tenant-scoped tables and the predicate tying each row to an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Customers,
    Pipelines,
    Deals,
    Tasks,
    ContactHistory,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Customers => "customers",
            Table::Pipelines => "pipelines",
            Table::Deals => "deals",
            Table::Tasks => "tasks",
            Table::ContactHistory => "contact_history",
        }
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        match self {
            Table::Customers => DeletionPolicy::Soft,
            _ => DeletionPolicy::Hard,
        }
    }

    /// SQL predicate restricting rows to the organization bound at `$param`.
    /// Deals reach their organization through the pipeline, tasks through
    /// the assignee and contact history through the (non-deleted) customer.
    pub fn tenant_predicate(&self, param: usize) -> String {
        match self {
            Table::Users | Table::Pipelines => format!("\"organization_id\" = ${}", param),
            Table::Customers => format!("\"organization_id\" = ${} AND \"deleted_at\" IS NULL", param),
            Table::Deals => format!(
                "\"pipeline_id\" IN (SELECT \"id\" FROM \"pipelines\" WHERE \"organization_id\" = ${})",
                param
            ),
            Table::Tasks => format!(
                "\"assignee_id\" IN (SELECT \"id\" FROM \"users\" WHERE \"organization_id\" = ${})",
                param
            ),
            Table::ContactHistory => format!(
                "\"customer_id\" IN (SELECT \"id\" FROM \"customers\" WHERE \"organization_id\" = ${} AND \"deleted_at\" IS NULL)",
                param
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_customers_are_soft_deleted() {
        assert_eq!(Table::Customers.deletion_policy(), DeletionPolicy::Soft);
        for table in [Table::Deals, Table::Tasks, Table::ContactHistory] {
            assert_eq!(table.deletion_policy(), DeletionPolicy::Hard);
        }
    }

    #[test]
    fn customer_scope_hides_deleted_rows() {
        let predicate = Table::Customers.tenant_predicate(2);
        assert!(predicate.contains("$2"));
        assert!(predicate.contains("\"deleted_at\" IS NULL"));
    }
}
