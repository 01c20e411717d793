/// A configuration builder with the given class declarations registered.
#[macro_export]
macro_rules! classes {
    (
        $( $class:expr ),* $(,)?
    ) => {{
        let mut builder = sqlmap::Configuration::builder();
        $( builder.register($class); )*
        builder
    }};
}
