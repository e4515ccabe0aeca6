// Run with `cargo run --example basic`

use fuzzy_tagging::{Fmd2Params, FmdKeyGen};

fn main() {
    let mut csprng = rand_core::OsRng;

    // Params
    let gamma = 24; // Gamma parameter: minimum false positive rate 2^-24.
    let n = 5; // Detection key precision: mailbox rate 2^-n.

    let params = Fmd2Params::new(gamma);

    println!("\nGLOBAL PARAMETERS");
    println!("-----------------");
    println!("gamma parameter: {:?}", gamma);
    println!(
        "false positive rate handed to the mailbox: {:?}",
        0.5_f32.powf(n as f32)
    );

    println!("\nWORKFLOW");
    println!("--------");
    println!("[Receiver side]");
    println!("\tGenerating secret and public keys with {:?} slots...", gamma);
    let (pk, sk) = params.generate_keys(&mut csprng);

    println!("\tExtracting a detection key of {:?} scalars for the mailbox...", n);
    let dk = sk.extract(n).unwrap();

    println!("[Sender side]");
    let mut storage_pool = vec![];

    println!("\tFlagging a message with the receiver's public key...");
    let flag = pk.generate_flag(&mut csprng);
    storage_pool.push(("shielded message for receiver".to_string(), flag));

    let stored_msgs = 1000;
    println!("[Storage pool side]");
    println!(
        "\tPopulating the pool with {:?} message/flag pairs for other receivers. It may take sometime...",
        stored_msgs
    );
    for i in 0..stored_msgs {
        let (another_pk, _) = params.generate_keys(&mut csprng);
        let another_flag = another_pk.generate_flag(&mut csprng);

        storage_pool.push((
            format!("shielded message for another receiver ({:?})", i),
            another_flag,
        ));
    }

    println!("[Mailbox side]");
    println!("\tFiltering {:?} stored messages with the detection key...", storage_pool.len());
    let mut filtered_messages = vec![];
    for (message, flag) in storage_pool.iter() {
        if dk.detect(flag) {
            filtered_messages.push(message);
        }
    }
    println!(
        "\t\tForwarded messages: {:?} (expected around {:?} false positives)",
        filtered_messages.len(),
        (stored_msgs as f32) * 0.5_f32.powf(n as f32)
    );

    println!("[Receiver side]");
    println!("\tNow you can run trial-decryption on the forwarded messages.");
}
