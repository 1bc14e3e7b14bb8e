macro_rules! register_exporters {
    (
        $(
            $module:ident => $exporter_type:ident
        ),* $(,)?
    ) => {
        // Import all exporter modules
        $(
            pub mod $module;
            pub use $module::$exporter_type;
        )*

        // Generate the enum with all exporter types
        pub enum ExporterType {
            $(
                $exporter_type($exporter_type),
            )*
        }

        // Implement Exporter trait for ExporterType enum
        impl Exporter for ExporterType {
            fn core(&self) -> &ExporterCore {
                match self {
                    $(
                        ExporterType::$exporter_type(e) => e.core(),
                    )*
                }
            }

            fn init<'a>(&'a mut self) -> BoxFuture<'a, Result<(), Error>> {
                match self {
                    $(
                        ExporterType::$exporter_type(e) => e.init(),
                    )*
                }
            }

            fn export<'a>(&'a self, data: &'a Matrix) -> BoxFuture<'a, Result<(), Error>> {
                match self {
                    $(
                        ExporterType::$exporter_type(e) => e.export(data),
                    )*
                }
            }
        }

        // Generate the constructor map, keyed by lowercase class name
        pub fn all_factories() -> &'static HashMap<&'static str, ExporterFactory> {
            static FACTORIES: Lazy<HashMap<&'static str, ExporterFactory>> = Lazy::new(|| {
                let mut map: HashMap<&'static str, ExporterFactory> = HashMap::new();
                $(
                    map.insert(
                        stringify!($module),
                        (|core| ExporterType::$exporter_type($exporter_type::new(core)))
                            as ExporterFactory,
                    );
                )*
                map
            });
            &FACTORIES
        }

        // Generate array of exporter class names
        pub const EXPORTER_NAMES: &[&str] = &[
            $(stringify!($module),)*
        ];
    };
}
