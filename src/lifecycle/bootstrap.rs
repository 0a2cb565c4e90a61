//! Process-wide assembly context for one command invocation.

use std::sync::Arc;

use crate::config::{
    Configuration, ConfigurationFactory, DefaultValidator, TomlConfigurationFactory, Validator,
};
use crate::http::server::{DefaultServerFactory, ServerFactory};
use crate::lifecycle::environment::{DefaultEnvironmentFactory, Environment, EnvironmentFactory};
use crate::BoxError;

/// Reusable unit of startup logic, run after the server is built and
/// before the application.
pub trait Bundle<C>: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, configuration: &C, environment: &mut Environment) -> Result<(), BoxError>;
}

/// The application being bootstrapped.
pub trait Application<C>: Send + Sync {
    fn name(&self) -> &str;

    /// Called once when the bootstrap is created; the place to add bundles
    /// or swap factories.
    fn initialize(&self, _bootstrap: &mut Bootstrap<C>) {}

    /// Register routes and health checks.
    fn run(&self, configuration: &C, environment: &mut Environment) -> Result<(), BoxError>;
}

/// Factories, bundles and application for one command invocation.
pub struct Bootstrap<C> {
    application: Arc<dyn Application<C>>,
    bundles: Vec<Box<dyn Bundle<C>>>,
    configuration_factory: Box<dyn ConfigurationFactory<C>>,
    validator: Box<dyn Validator<C>>,
    environment_factory: Box<dyn EnvironmentFactory<C>>,
    server_factory: Box<dyn ServerFactory<C>>,
}

impl<C: Configuration> Bootstrap<C> {
    /// Default factories, then `application.initialize()`.
    pub fn new(application: impl Application<C> + 'static) -> Self {
        let application: Arc<dyn Application<C>> = Arc::new(application);
        let mut bootstrap = Self {
            application: Arc::clone(&application),
            bundles: Vec::new(),
            configuration_factory: Box::new(TomlConfigurationFactory::new()),
            validator: Box::new(DefaultValidator::new()),
            environment_factory: Box::new(DefaultEnvironmentFactory::new()),
            server_factory: Box::new(DefaultServerFactory),
        };
        application.initialize(&mut bootstrap);
        bootstrap
    }
}

impl<C> Bootstrap<C> {
    /// Bundles run in the order they are added.
    pub fn add_bundle(&mut self, bundle: impl Bundle<C> + 'static) {
        self.bundles.push(Box::new(bundle));
    }

    pub fn set_configuration_factory(&mut self, factory: impl ConfigurationFactory<C> + 'static) {
        self.configuration_factory = Box::new(factory);
    }

    pub fn set_validator(&mut self, validator: impl Validator<C> + 'static) {
        self.validator = Box::new(validator);
    }

    pub fn set_environment_factory(&mut self, factory: impl EnvironmentFactory<C> + 'static) {
        self.environment_factory = Box::new(factory);
    }

    pub fn set_server_factory(&mut self, factory: impl ServerFactory<C> + 'static) {
        self.server_factory = Box::new(factory);
    }

    pub fn application(&self) -> &dyn Application<C> {
        self.application.as_ref()
    }

    pub fn bundles(&self) -> &[Box<dyn Bundle<C>>] {
        &self.bundles
    }

    pub fn configuration_factory(&self) -> &dyn ConfigurationFactory<C> {
        self.configuration_factory.as_ref()
    }

    pub fn validator(&self) -> &dyn Validator<C> {
        self.validator.as_ref()
    }

    pub fn environment_factory(&self) -> &dyn EnvironmentFactory<C> {
        self.environment_factory.as_ref()
    }

    pub fn server_factory(&self) -> &dyn ServerFactory<C> {
        self.server_factory.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultConfiguration;

    struct Named(&'static str);

    impl Bundle<DefaultConfiguration> for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn run(&self, _: &DefaultConfiguration, _: &mut Environment) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct WithBundles;

    impl Application<DefaultConfiguration> for WithBundles {
        fn name(&self) -> &str {
            "with-bundles"
        }

        fn initialize(&self, bootstrap: &mut Bootstrap<DefaultConfiguration>) {
            bootstrap.add_bundle(Named("first"));
            bootstrap.add_bundle(Named("second"));
        }

        fn run(&self, _: &DefaultConfiguration, _: &mut Environment) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn initialize_registers_bundles_in_order() {
        let bootstrap = Bootstrap::new(WithBundles);
        let names: Vec<&str> = bootstrap.bundles().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(bootstrap.application().name(), "with-bundles");
    }
}
