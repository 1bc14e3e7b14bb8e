macro_rules! register_collectors {
    (
        $(
            $module:ident => $collector_type:ident
        ),* $(,)?
    ) => {
        // Import all collector modules
        $(
            pub mod $module;
            pub use $module::$collector_type;
        )*

        // Generate the enum with all collector types
        pub enum CollectorType {
            $(
                $collector_type($collector_type),
            )*
        }

        // Implement Collector trait for CollectorType enum
        impl Collector for CollectorType {
            fn core(&self) -> &CollectorCore {
                match self {
                    $(
                        CollectorType::$collector_type(c) => c.core(),
                    )*
                }
            }

            fn core_mut(&mut self) -> &mut CollectorCore {
                match self {
                    $(
                        CollectorType::$collector_type(c) => c.core_mut(),
                    )*
                }
            }

            fn init(&mut self) -> Result<(), Error> {
                match self {
                    $(
                        CollectorType::$collector_type(c) => c.init(),
                    )*
                }
            }

            fn poll_data<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>> {
                match self {
                    $(
                        CollectorType::$collector_type(c) => c.poll_data(),
                    )*
                }
            }
        }

        // Generate the constructor map, keyed by lowercase class name
        pub fn all_factories() -> &'static HashMap<&'static str, CollectorFactory> {
            static FACTORIES: Lazy<HashMap<&'static str, CollectorFactory>> = Lazy::new(|| {
                let mut map: HashMap<&'static str, CollectorFactory> = HashMap::new();
                $(
                    map.insert(
                        stringify!($module),
                        (|core| CollectorType::$collector_type($collector_type::new(core)))
                            as CollectorFactory,
                    );
                )*
                map
            });
            &FACTORIES
        }

        // Generate array of collector class names
        pub const COLLECTOR_NAMES: &[&str] = &[
            $(stringify!($module),)*
        ];
    };
}
