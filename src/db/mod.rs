pub mod dbschema;
