//! User-facing alert texts

pub const LOAD_CLIENTS_FAILED: &str = "Ошибка при загрузке списка клиентов";
pub const DELETE_CLIENT_FAILED: &str = "Ошибка при удалении клиента";
pub const VISIBILITY_FAILED: &str = "Ошибка при изменении видимости иконок";
pub const SAVE_CLIENT_FAILED: &str = "Ошибка при сохранении клиента";
pub const STATUS_FAILED: &str = "Ошибка при изменении статуса клиента";
pub const CLIENT_FORM_INCOMPLETE: &str = "Заполните фамилию, имя и год";

pub const FILE_TOO_LARGE: &str = "Размер файла не должен превышать 5MB";
pub const UNSUPPORTED_IMAGE: &str = "Допустимы только изображения PNG, JPG или WEBP";
pub const UPLOAD_FAILED: &str = "Ошибка при загрузке изображения";

pub const LOAD_PRODUCTS_FAILED: &str = "Ошибка при загрузке товаров";
pub const PRODUCT_NOT_FOUND: &str = "Товар не найден";
