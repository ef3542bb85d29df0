use std::fmt;

use itertools::Itertools;

use crate::graph::NodeId;

/// One evaluation of one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTrace {
    pub rule: String,
    /// Tuples this evaluation added to the head relation, rendered as
    /// `col=val, col=val`.
    pub derived: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentReport {
    pub members: Vec<NodeId>,
    pub passes: usize,
    pub traces: Vec<RuleTrace>,
}

impl ComponentReport {
    pub fn member_list(&self) -> String {
        self.members.iter().map(|id| format!("R{}", id)).join(",")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleReport {
    /// Rules evaluated component by component in dependency order.
    Optimized(Vec<ComponentReport>),
    /// Every rule evaluated on every pass until nothing changes.
    Naive(ComponentReport),
}

impl RuleReport {
    pub fn total_passes(&self) -> usize {
        match self {
            RuleReport::Optimized(components) => components.iter().map(|c| c.passes).sum(),
            RuleReport::Naive(component) => component.passes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryAnswer {
    pub query: String,
    /// Matching rows before projection. Zero means the answer is `No`.
    pub matches: usize,
    /// Distinct bindings rendered as `var=val, var=val`, sorted.
    pub bindings: Vec<String>,
}

impl QueryAnswer {
    pub fn no(query: String) -> Self {
        Self {
            query,
            matches: 0,
            bindings: Vec::new(),
        }
    }

    pub fn is_yes(&self) -> bool {
        self.matches > 0
    }
}

impl fmt::Display for QueryAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_yes() {
            write!(f, "{}? Yes({})", self.query, self.matches)?;
        } else {
            write!(f, "{}? No", self.query)?;
        }
        for binding in &self.bindings {
            write!(f, "\n  {}", binding)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub dependency_graph: Option<String>,
    pub postorder: Option<String>,
    pub rules: RuleReport,
    pub queries: Vec<QueryAnswer>,
    /// Print each rule and the tuples it derived, not only pass counts.
    pub trace_rules: bool,
}

impl Report {
    fn write_traces(&self, f: &mut fmt::Formatter<'_>, traces: &[RuleTrace]) -> fmt::Result {
        if !self.trace_rules {
            return Ok(());
        }
        for trace in traces {
            writeln!(f, "{}", trace.rule)?;
            for tuple in &trace.derived {
                writeln!(f, "  {}", tuple)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(graph) = &self.dependency_graph {
            writeln!(f, "Dependency Graph")?;
            writeln!(f, "{}", graph)?;
        }
        if let Some(postorder) = &self.postorder {
            writeln!(f, "Postorder Numbers")?;
            writeln!(f, "{}", postorder)?;
        }

        writeln!(f, "Rule Evaluation")?;
        match &self.rules {
            RuleReport::Optimized(components) => {
                for component in components {
                    writeln!(f, "SCC: {}", component.member_list())?;
                    self.write_traces(f, &component.traces)?;
                    writeln!(f, "{} passes: {}", component.passes, component.member_list())?;
                }
            }
            RuleReport::Naive(component) => {
                self.write_traces(f, &component.traces)?;
                writeln!(f)?;
                writeln!(
                    f,
                    "Schemes populated after {} passes through the Rules.",
                    component.passes
                )?;
            }
        }

        write!(f, "\nQuery Evaluation")?;
        for answer in &self.queries {
            write!(f, "\n{}", answer)?;
        }
        Ok(())
    }
}
