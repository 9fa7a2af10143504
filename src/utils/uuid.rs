use uuid::Uuid;

pub fn get_uuidv4() -> String {
    let uuid = Uuid::new_v4();
    let uuid_str = uuid.to_string().replace("-", "");
    return uuid_str;
}

/// Short id used to tell connections apart in the logs.
pub fn get_conn_id() -> String {
    let mut id = get_uuidv4();
    id.truncate(8);
    id
}
