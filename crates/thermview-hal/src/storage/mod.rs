pub mod settings_record;
