use strum_macros::{Display, EnumIter};

/// Role marker attached to a bean definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Stereotype {
    #[default]
    Component,
    Controller,
    Service,
    Repository,
    Configuration,
    /// Produced by a factory method on a configuration bean.
    Bean,
}

impl Stereotype {
    /// Stereotypes picked up by the classpath scanner. `Component` is what a derive
    /// without a role flag produces, so it is scanned too.
    pub const SCANNED: [Stereotype; 5] = [
        Stereotype::Component,
        Stereotype::Controller,
        Stereotype::Service,
        Stereotype::Repository,
        Stereotype::Configuration,
    ];

    pub fn is_scanned(&self) -> bool {
        Self::SCANNED.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_factory_beans_are_not_scanned() {
        let scanned: Vec<_> = Stereotype::iter().filter(Stereotype::is_scanned).collect();
        assert_eq!(scanned.len(), 5);
        assert!(!Stereotype::Bean.is_scanned());
        assert!(Stereotype::Component.is_scanned());
        assert_eq!(Stereotype::Controller.to_string(), "Controller");
    }
}
